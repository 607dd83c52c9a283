/*!
 Contains logic to parse a NIB archive from a byte slice.

 Format reference:
   - [`NibArchive.md`](https://github.com/matsmattsson/nibsqueeze/blob/master/NibArchive.md)
*/

use tracing::warn;

use crate::{
    archive::models::{ClassName, Header, Key, NibArchive, Object, Value, ValueData},
    error::archive::NibArchiveError,
};

/// Magic bytes at the start of every NIB archive
pub const MAGIC: &[u8; 10] = b"NIBArchive";

/// Indicates an [`i8`] payload
const INT8: u8 = 0x00;
/// Indicates an [`i16`] payload
const INT16: u8 = 0x01;
/// Indicates an [`i32`] payload
const INT32: u8 = 0x02;
/// Indicates an [`i64`] payload
const INT64: u8 = 0x03;
/// Boolean true, carries no payload
const BOOL_TRUE: u8 = 0x04;
/// Boolean false, carries no payload
const BOOL_FALSE: u8 = 0x05;
/// Indicates an [`f32`] payload
const FLOAT: u8 = 0x06;
/// Indicates an [`f64`] payload
const DOUBLE: u8 = 0x07;
/// Indicates a length-prefixed data payload
const DATA: u8 = 0x08;
/// Nil, carries no payload
const NIL: u8 = 0x09;
/// Indicates an index into the object table, stored as an [`i32`]
const OBJECT_REF: u8 = 0x0A;
/// First byte of a data payload holding packed doubles
const VECTOR_MARKER: u8 = 0x07;

/// Check whether `data` begins with the NIB archive magic bytes
pub fn is_nib(data: &[u8]) -> bool {
    data.len() >= MAGIC.len() && &data[..MAGIC.len()] == MAGIC
}

/// Decode a variable-length integer from the start of `buf`, returning the
/// value and the number of bytes consumed
///
/// Each byte contributes its low 7 bits at an increasing shift; the byte
/// that has its high bit set is the last one of the sequence. Running out of
/// bytes mid-sequence is an error, so the loop always terminates. An
/// over-long sequence is still consumed to its terminating byte, but groups
/// past the 64th bit are ignored; the format stores table indices and
/// lengths, none of which need them.
pub fn varint(buf: &[u8]) -> Result<(u64, usize), NibArchiveError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (count, byte) in buf.iter().enumerate() {
        if shift < u64::BITS {
            result |= u64::from(byte & 0x7F) << shift;
        }
        shift += 7;
        if byte & 0x80 != 0 {
            return Ok((result, count + 1));
        }
    }
    Err(NibArchiveError::TruncatedInput(buf.len() + 1, buf.len()))
}

/// Contains logic and data used to parse a NIB archive
///
/// The cursor doubles as the running byte offset that is checked against the
/// offsets the header declares for each table. When verification is disabled
/// a mismatch is only logged and parsing continues from the actual cursor
/// position, which can desynchronize later tables; this mirrors how existing
/// tooling uses the format in best-effort mode.
#[derive(Debug)]
pub struct NibArchiveReader<'a> {
    /// The archive we want to parse
    stream: &'a [u8],
    /// The current index we are at in the stream
    idx: usize,
    /// Whether declared table offsets are enforced
    verify: bool,
}

impl<'a> NibArchiveReader<'a> {
    /// Create a reader with offset verification enabled
    pub fn new(stream: &'a [u8]) -> Self {
        Self::with_verification(stream, true)
    }

    pub fn with_verification(stream: &'a [u8], verify: bool) -> Self {
        Self {
            stream,
            idx: 0,
            verify,
        }
    }

    /// Parse the complete archive
    ///
    /// The four tables are read in fixed order, each checked against the
    /// offset the header declares for it. No partial archive is returned on
    /// error; a nested archive that fails to parse fails the outer parse too.
    pub fn parse(&mut self) -> Result<NibArchive, NibArchiveError> {
        let header = self.read_header()?;

        self.check_offset("objects", header.objects_offset)?;
        let objects = self.read_objects(header.object_count)?;

        self.check_offset("keys", header.keys_offset)?;
        let keys = self.read_keys(header.key_count)?;

        self.check_offset("values", header.values_offset)?;
        let values = self.read_values(header.value_count)?;

        self.check_offset("class names", header.class_names_offset)?;
        let class_names = self.read_class_names(header.class_name_count)?;

        Ok(NibArchive::new(header, objects, keys, values, class_names))
    }

    /// Read the magic bytes and the ten header integers, leaving the cursor
    /// at the first byte after the header
    fn read_header(&mut self) -> Result<Header, NibArchiveError> {
        if !is_nib(self.stream) {
            return Err(NibArchiveError::BadMagic);
        }
        self.idx += MAGIC.len();

        Ok(Header {
            unknown_1: self.read_i32()?,
            unknown_2: self.read_i32()?,
            object_count: self.read_i32()?,
            objects_offset: self.read_i32()?,
            key_count: self.read_i32()?,
            keys_offset: self.read_i32()?,
            value_count: self.read_i32()?,
            values_offset: self.read_i32()?,
            class_name_count: self.read_i32()?,
            class_names_offset: self.read_i32()?,
        })
    }

    /// Compare the cursor against the offset the header declares for the
    /// table about to be read
    fn check_offset(&self, table: &'static str, declared: i32) -> Result<(), NibArchiveError> {
        let expected = declared as usize;
        if self.idx == expected {
            return Ok(());
        }
        if self.verify {
            return Err(NibArchiveError::OffsetMismatch(table, expected, self.idx));
        }
        warn!(
            table,
            expected,
            actual = self.idx,
            "table offset mismatch, continuing from the actual position"
        );
        Ok(())
    }

    /// Cap a pre-allocation derived from an untrusted count: every table
    /// entry consumes at least one byte, so a count beyond the remaining
    /// stream can never be satisfied
    fn capacity_hint(&self, count: usize) -> usize {
        count.min(self.stream.len() - self.idx)
    }

    fn read_objects(&mut self, count: i32) -> Result<Vec<Object>, NibArchiveError> {
        let mut objects = Vec::with_capacity(self.capacity_hint(count.max(0) as usize));
        for _ in 0..count {
            let class_name_index = self.read_varint()? as usize;
            let values_index = self.read_varint()? as usize;
            let value_count = self.read_varint()? as usize;
            objects.push(Object {
                class_name_index,
                values_index,
                value_count,
            });
        }
        Ok(objects)
    }

    fn read_keys(&mut self, count: i32) -> Result<Vec<Key>, NibArchiveError> {
        let mut keys = Vec::with_capacity(self.capacity_hint(count.max(0) as usize));
        for _ in 0..count {
            let length = self.read_varint()? as usize;
            let name = self.read_exact_as_string(length)?;
            keys.push(Key { name });
        }
        Ok(keys)
    }

    fn read_values(&mut self, count: i32) -> Result<Vec<Value>, NibArchiveError> {
        let mut values = Vec::with_capacity(self.capacity_hint(count.max(0) as usize));
        for _ in 0..count {
            values.push(self.read_value()?);
        }
        Ok(values)
    }

    fn read_class_names(&mut self, count: i32) -> Result<Vec<ClassName>, NibArchiveError> {
        let mut class_names = Vec::with_capacity(self.capacity_hint(count.max(0) as usize));
        for _ in 0..count {
            let length = self.read_varint()? as usize;
            let extras_count = self.read_varint()? as usize;
            let mut extras = Vec::with_capacity(self.capacity_hint(extras_count));
            for _ in 0..extras_count {
                extras.push(self.read_i32()?);
            }

            // The stored name is NUL terminated; the terminator is not part
            // of the name
            let raw = self.read_exact_bytes(length)?;
            let name_bytes = raw.strip_suffix(&[0]).unwrap_or(raw);
            let name = std::str::from_utf8(name_bytes)
                .map_err(NibArchiveError::StringParseError)?
                .to_string();
            class_names.push(ClassName { name, extras });
        }
        Ok(class_names)
    }

    /// Read a single value: its key index, its type tag, and the payload the
    /// tag calls for
    fn read_value(&mut self) -> Result<Value, NibArchiveError> {
        let key_index = self.read_varint()? as usize;
        let data = match self.read_u8()? {
            INT8 => ValueData::Int8(self.read_i8()?),
            INT16 => ValueData::Int16(self.read_i16()?),
            INT32 => ValueData::Int32(self.read_i32()?),
            INT64 => ValueData::Int64(self.read_i64()?),
            BOOL_TRUE => ValueData::Bool(true),
            BOOL_FALSE => ValueData::Bool(false),
            FLOAT => ValueData::Float(self.read_f32()?),
            DOUBLE => ValueData::Double(self.read_f64()?),
            DATA => self.read_data()?,
            NIL => ValueData::Nil,
            OBJECT_REF => ValueData::ObjectRef(self.read_i32()?),
            other => return Err(NibArchiveError::UnknownValueType(other)),
        };
        Ok(Value { key_index, data })
    }

    /// Read a length-prefixed data payload, reinterpreting the two special
    /// shapes the format embeds in it
    ///
    /// A payload that begins with the archive magic is a complete nested
    /// archive and is parsed recursively with the same verification setting.
    /// A `0x07`-marked payload of exactly 17 or 33 bytes holds two or four
    /// packed doubles. Anything else is kept as raw bytes.
    fn read_data(&mut self) -> Result<ValueData, NibArchiveError> {
        let length = self.read_varint()? as usize;
        let payload = self.read_exact_bytes(length)?;

        if length > MAGIC.len() && is_nib(payload) {
            let mut reader = NibArchiveReader::with_verification(payload, self.verify);
            return Ok(ValueData::Archive(reader.parse()?));
        }

        if payload.first() == Some(&VECTOR_MARKER) {
            match length {
                17 => {
                    let mut doubles = [0.0f64; 2];
                    for (slot, chunk) in doubles.iter_mut().zip(payload[1..].chunks_exact(8)) {
                        *slot = f64::from_le_bytes(
                            chunk.try_into().map_err(NibArchiveError::SliceError)?,
                        );
                    }
                    return Ok(ValueData::Vector2(doubles));
                }
                33 => {
                    let mut doubles = [0.0f64; 4];
                    for (slot, chunk) in doubles.iter_mut().zip(payload[1..].chunks_exact(8)) {
                        *slot = f64::from_le_bytes(
                            chunk.try_into().map_err(NibArchiveError::SliceError)?,
                        );
                    }
                    return Ok(ValueData::Vector4(doubles));
                }
                _ => {}
            }
        }

        Ok(ValueData::Bytes(payload.to_vec()))
    }

    /// Read exactly `n` bytes from the stream
    fn read_exact_bytes(&mut self, n: usize) -> Result<&'a [u8], NibArchiveError> {
        let end = self.idx.saturating_add(n);
        let range = self
            .stream
            .get(self.idx..end)
            .ok_or(NibArchiveError::TruncatedInput(end, self.stream.len()))?;
        self.idx = end;
        Ok(range)
    }

    /// Read `n` bytes as a String
    fn read_exact_as_string(&mut self, n: usize) -> Result<String, NibArchiveError> {
        let str = std::str::from_utf8(self.read_exact_bytes(n)?)
            .map_err(NibArchiveError::StringParseError)?;
        Ok(str.to_string())
    }

    fn read_varint(&mut self) -> Result<u64, NibArchiveError> {
        let (value, count) = varint(&self.stream[self.idx..])?;
        self.idx += count;
        Ok(value)
    }

    fn read_u8(&mut self) -> Result<u8, NibArchiveError> {
        Ok(self.read_exact_bytes(1)?[0])
    }

    fn read_i8(&mut self) -> Result<i8, NibArchiveError> {
        Ok(i8::from_le_bytes([self.read_u8()?]))
    }

    fn read_i16(&mut self) -> Result<i16, NibArchiveError> {
        Ok(i16::from_le_bytes(
            self.read_exact_bytes(2)?
                .try_into()
                .map_err(NibArchiveError::SliceError)?,
        ))
    }

    fn read_i32(&mut self) -> Result<i32, NibArchiveError> {
        Ok(i32::from_le_bytes(
            self.read_exact_bytes(4)?
                .try_into()
                .map_err(NibArchiveError::SliceError)?,
        ))
    }

    fn read_i64(&mut self) -> Result<i64, NibArchiveError> {
        Ok(i64::from_le_bytes(
            self.read_exact_bytes(8)?
                .try_into()
                .map_err(NibArchiveError::SliceError)?,
        ))
    }

    fn read_f32(&mut self) -> Result<f32, NibArchiveError> {
        Ok(f32::from_le_bytes(
            self.read_exact_bytes(4)?
                .try_into()
                .map_err(NibArchiveError::SliceError)?,
        ))
    }

    fn read_f64(&mut self) -> Result<f64, NibArchiveError> {
        Ok(f64::from_le_bytes(
            self.read_exact_bytes(8)?
                .try_into()
                .map_err(NibArchiveError::SliceError)?,
        ))
    }
}
