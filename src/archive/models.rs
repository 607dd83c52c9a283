/*!
 Data structures representing a decoded NIB archive and the read-only query
 API that resolves the relationships between its four tables.
*/

use std::collections::HashMap;

use crate::error::archive::NibArchiveError;

/// The fixed-size header at the start of every NIB archive
///
/// For each of the four tables the header stores an entry count and the byte
/// offset at which that table starts, measured from the beginning of the
/// archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub unknown_1: i32,
    pub unknown_2: i32,
    pub object_count: i32,
    pub objects_offset: i32,
    pub key_count: i32,
    pub keys_offset: i32,
    pub value_count: i32,
    pub values_offset: i32,
    pub class_name_count: i32,
    pub class_names_offset: i32,
}

/// Represents a class name in a NIB archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassName {
    /// The stored name with its trailing NUL terminator stripped
    pub name: String,
    /// Extra integers stored alongside the name; their meaning is unknown
    pub extras: Vec<i32>,
}

/// Represents a key in a NIB archive
///
/// Keys identify the values attached to an object and compare and hash by
/// name only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub name: String,
}

/// Represents an object in a NIB archive
///
/// An object does not own its values directly; it addresses a contiguous
/// window of the archive's shared value table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    /// Index into the class name table
    pub class_name_index: usize,
    /// Index of the first value belonging to this object
    pub values_index: usize,
    /// Number of consecutive values belonging to this object
    pub value_count: usize,
}

/// Represents a value in a NIB archive
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    /// Index of the key this value is stored under
    pub key_index: usize,
    pub data: ValueData,
}

/// Decoded payload of a value, one variant per type tag
///
/// [`ValueData::Vector2`], [`ValueData::Vector4`], and [`ValueData::Archive`]
/// have no tag of their own on the wire; they are data payloads whose
/// interior structure is recognized during decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Bool(bool),
    Float(f32),
    Double(f64),
    /// A data payload with no recognized interior structure
    Bytes(Vec<u8>),
    /// A 17-byte `0x07` data payload: two packed doubles, e.g. a point or a size
    Vector2([f64; 2]),
    /// A 33-byte `0x07` data payload: four packed doubles, e.g. a rectangle
    Vector4([f64; 4]),
    Nil,
    /// Index into the object table
    ObjectRef(i32),
    /// A data payload that is itself a complete archive
    Archive(NibArchive),
}

/// A fully decoded NIB archive
///
/// Immutable once parsing completes. Consumers resolve relationships between
/// the tables through the accessors below rather than by indexing the tables
/// themselves; indices stored in a malformed archive can point outside their
/// table, which the accessors report as
/// [`IndexOutOfRange`](NibArchiveError::IndexOutOfRange).
#[derive(Debug, Clone, PartialEq)]
pub struct NibArchive {
    header: Header,
    objects: Vec<Object>,
    keys: Vec<Key>,
    values: Vec<Value>,
    class_names: Vec<ClassName>,
}

impl NibArchive {
    pub(crate) fn new(
        header: Header,
        objects: Vec<Object>,
        keys: Vec<Key>,
        values: Vec<Value>,
        class_names: Vec<ClassName>,
    ) -> Self {
        Self {
            header,
            objects,
            keys,
            values,
            class_names,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn class_names(&self) -> &[ClassName] {
        &self.class_names
    }

    /// Get the values that belong to `object`: its window into the value table
    pub fn object_values(&self, object: &Object) -> Result<&[Value], NibArchiveError> {
        let end = object.values_index.saturating_add(object.value_count);
        self.values
            .get(object.values_index..end)
            .ok_or(NibArchiveError::IndexOutOfRange(
                "values",
                end,
                self.values.len(),
            ))
    }

    /// Map an object's values by the keys they are stored under
    ///
    /// The format does not specify what a duplicate key index within one
    /// object's window means; the last occurrence wins.
    pub fn object_items(&self, object: &Object) -> Result<HashMap<&Key, &Value>, NibArchiveError> {
        let mut items = HashMap::new();
        for value in self.object_values(object)? {
            items.insert(self.value_key(value)?, value);
        }
        Ok(items)
    }

    /// Get the key a value is stored under
    pub fn value_key(&self, value: &Value) -> Result<&Key, NibArchiveError> {
        self.keys
            .get(value.key_index)
            .ok_or(NibArchiveError::IndexOutOfRange(
                "keys",
                value.key_index,
                self.keys.len(),
            ))
    }

    /// Get the class name of an object
    pub fn class_name(&self, object: &Object) -> Result<&ClassName, NibArchiveError> {
        self.class_names
            .get(object.class_name_index)
            .ok_or(NibArchiveError::IndexOutOfRange(
                "class names",
                object.class_name_index,
                self.class_names.len(),
            ))
    }

    /// Find the position of the key with the given name, if one exists
    pub fn find_key(&self, name: &str) -> Option<usize> {
        self.keys.iter().position(|key| key.name == name)
    }
}
