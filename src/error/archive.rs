/*!
 Errors that can happen when parsing NIB archive data.
*/

use std::{
    array::TryFromSliceError,
    fmt::{Display, Formatter, Result},
    str::Utf8Error,
};

/// Errors that can happen when parsing NIB archive data
#[derive(Debug)]
pub enum NibArchiveError {
    /// The input does not start with the `NIBArchive` magic bytes
    BadMagic,
    /// The byte source ended before an expected field could be fully read
    TruncatedInput(usize, usize),
    /// A table's parsed end offset disagrees with the offset the header declares
    /// for the named table
    OffsetMismatch(&'static str, usize, usize),
    /// A value's type tag byte has no known decoding
    UnknownValueType(u8),
    /// An index stored in the archive points outside the named table
    IndexOutOfRange(&'static str, usize, usize),
    SliceError(TryFromSliceError),
    StringParseError(Utf8Error),
}

impl Display for NibArchiveError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            NibArchiveError::BadMagic => write!(fmt, "Expected NIBArchive magic at byte 0!"),
            NibArchiveError::TruncatedInput(end, len) => {
                write!(fmt, "Input ended at {len:#x} before byte {end:#x} could be read!")
            }
            NibArchiveError::OffsetMismatch(table, expected, actual) => {
                write!(
                    fmt,
                    "Expected {table} table at offset {expected:#x} - parsed to {actual:#x}!"
                )
            }
            NibArchiveError::UnknownValueType(byte) => {
                write!(fmt, "Unknown value type: {byte:#x}")
            }
            NibArchiveError::IndexOutOfRange(table, index, len) => {
                write!(
                    fmt,
                    "Index {index} is outside of the {table} table of length {len}!"
                )
            }
            NibArchiveError::SliceError(why) => {
                write!(fmt, "Unable to slice source stream: {why}")
            }
            NibArchiveError::StringParseError(why) => write!(fmt, "Failed to parse string: {why}"),
        }
    }
}
