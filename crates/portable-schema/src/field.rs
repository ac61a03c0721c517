// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field descriptors and the closed set of Portable field types.

use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Type of a single Portable field, with its stable one-byte wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FieldType {
    Portable = 0,
    Byte = 1,
    Boolean = 2,
    Char = 3,
    Short = 4,
    Int = 5,
    Long = 6,
    Float = 7,
    Double = 8,
    Utf = 9,
    PortableArray = 10,
    ByteArray = 11,
    BooleanArray = 12,
    CharArray = 13,
    ShortArray = 14,
    IntArray = 15,
    LongArray = 16,
    FloatArray = 17,
    DoubleArray = 18,
    UtfArray = 19,
}

impl FieldType {
    /// Decode a wire tag. Returns `None` for tags outside the closed set.
    pub fn from_id(id: u8) -> Option<Self> {
        let field_type = match id {
            0 => Self::Portable,
            1 => Self::Byte,
            2 => Self::Boolean,
            3 => Self::Char,
            4 => Self::Short,
            5 => Self::Int,
            6 => Self::Long,
            7 => Self::Float,
            8 => Self::Double,
            9 => Self::Utf,
            10 => Self::PortableArray,
            11 => Self::ByteArray,
            12 => Self::BooleanArray,
            13 => Self::CharArray,
            14 => Self::ShortArray,
            15 => Self::IntArray,
            16 => Self::LongArray,
            17 => Self::FloatArray,
            18 => Self::DoubleArray,
            19 => Self::UtfArray,
            _ => return None,
        };
        Some(field_type)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// True for fields whose layout is itself a nested class definition.
    pub fn is_portable(self) -> bool {
        matches!(self, Self::Portable | Self::PortableArray)
    }
}

/// Field name exactly as written on the wire.
///
/// Names carry no assumed encoding: lookups and equality compare raw bytes.
/// UTF-8 names can be viewed as `&str`; `Display` is lossy for the others.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(Box<[u8]>);

impl FieldName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as text, `None` when it is not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(name) => fmt::Debug::fmt(name, f),
            None => write!(f, "b\"{}\"", self.0.escape_ascii()),
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Borrow<[u8]> for FieldName {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for FieldName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().into())
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        Self(name.into_bytes().into_boxed_slice())
    }
}

impl From<&[u8]> for FieldName {
    fn from(name: &[u8]) -> Self {
        Self(name.into())
    }
}

impl<const N: usize> From<&[u8; N]> for FieldName {
    fn from(name: &[u8; N]) -> Self {
        Self(name.as_slice().into())
    }
}

impl From<Vec<u8>> for FieldName {
    fn from(name: Vec<u8>) -> Self {
        Self(name.into_boxed_slice())
    }
}

impl PartialEq<str> for FieldName {
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other.as_bytes()
    }
}

impl PartialEq<&str> for FieldName {
    fn eq(&self, other: &&str) -> bool {
        *self.0 == *other.as_bytes()
    }
}

/// UTF-8 names serialize as strings, other names as byte sequences.
impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_bytes(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Bytes(Vec<u8>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(name) => name.into(),
            Repr::Bytes(name) => name.into(),
        })
    }
}

/// Immutable descriptor of one field of a class definition.
///
/// Leaf fields carry `factory_id == class_id == 0`; Portable and
/// PortableArray fields carry the identity of the nested class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDefinition {
    index: usize,
    name: FieldName,
    field_type: FieldType,
    #[serde(default)]
    factory_id: i32,
    #[serde(default)]
    class_id: i32,
}

impl FieldDefinition {
    pub fn new(
        index: usize,
        name: impl Into<FieldName>,
        field_type: FieldType,
        factory_id: i32,
        class_id: i32,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            field_type,
            factory_id,
            class_id,
        }
    }

    /// Leaf field with no nested identity.
    pub fn leaf(index: usize, name: impl Into<FieldName>, field_type: FieldType) -> Self {
        Self::new(index, name, field_type, 0, 0)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &FieldName {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn factory_id(&self) -> i32 {
        self.factory_id
    }

    pub fn class_id(&self) -> i32 {
        self.class_id
    }
}

impl fmt::Display for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldDefinition(index={}, name={}, type={:?}, factory_id={}, class_id={})",
            self.index, self.name, self.field_type, self.factory_id, self.class_id
        )
    }
}
