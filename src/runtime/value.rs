// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decoded values.
//!
//! Language-neutral result of mapping a byte stream: integers, floats,
//! text, byte buffers, and ordered composites. Structure and format
//! values preserve member declaration order.

use uuid::Uuid;

/// A value decoded by a data type map.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    UnsignedInteger(u64),
    Float(f64),
    Character(char),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    /// Ordered member-name to value mapping.
    Structure(Vec<(String, Value)>),
    Sequence(Vec<Value>),
    /// Positional per-member decodes sharing one offset.
    Union(Vec<Value>),
    /// Enumeration number with the symbolic name when declared.
    Enum(i64, Option<String>),
    /// Ordered layout-entry to value mapping.
    Format(Vec<(String, Value)>),
}

impl Value {
    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get as a signed integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::UnsignedInteger(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Try to get as an unsigned integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UnsignedInteger(value) => Some(*value),
            Self::Integer(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Try to get as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Try to get as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) => Some(value),
            _ => None,
        }
    }

    /// Try to get as a UUID.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get as an element sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(values) | Self::Union(values) => Some(values),
            _ => None,
        }
    }

    /// Try to get a structure or format member by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Structure(entries) | Self::Format(entries) => entries
                .iter()
                .find(|(entry_name, _)| entry_name == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Structure or format entries in declaration order.
    pub fn entries(&self) -> Option<&[(String, Value)]> {
        match self {
            Self::Structure(entries) | Self::Format(entries) => Some(entries),
            _ => None,
        }
    }

    /// Enumeration symbolic name, when the number matched a declared
    /// value.
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            Self::Enum(_, name) => name.as_deref(),
            _ => None,
        }
    }

    /// The value as a signed integer for expression evaluation.
    pub(crate) fn integer_value(&self) -> Option<i64> {
        match self {
            Self::Boolean(value) => Some(i64::from(*value)),
            Self::Integer(value) => Some(*value),
            Self::UnsignedInteger(value) => i64::try_from(*value).ok(),
            Self::Character(value) => Some(i64::from(u32::from(*value))),
            Self::Enum(number, _) => Some(*number),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UnsignedInteger(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_accessors() {
        let value = Value::Integer(-2);
        assert_eq!(value.as_i64(), Some(-2));
        assert_eq!(value.as_u64(), None);

        let value = Value::UnsignedInteger(7);
        assert_eq!(value.as_i64(), Some(7));
        assert_eq!(value.as_u64(), Some(7));
    }

    #[test]
    fn test_structure_field_access() {
        let value = Value::Structure(vec![
            ("x".to_string(), Value::Integer(1)),
            ("y".to_string(), Value::Integer(-2)),
        ]);
        assert_eq!(value.field("y").and_then(Value::as_i64), Some(-2));
        assert!(value.field("z").is_none());
        assert_eq!(value.entries().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_enum_name() {
        let value = Value::Enum(4, Some("FILE_TYPE_DIRECTORY".to_string()));
        assert_eq!(value.enum_name(), Some("FILE_TYPE_DIRECTORY"));
        assert_eq!(value.integer_value(), Some(4));

        let value = Value::Enum(99, None);
        assert_eq!(value.enum_name(), None);
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from("abc"), Value::String("abc".to_string()));
        assert_eq!(Value::from(3i64), Value::Integer(3));
    }
}
