// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Folding values back into byte streams.
//!
//! The inverse of mapping: given a decoded (or constructed) value and a
//! data type map, produce the encoded bytes. Folding is supported for
//! every kind with a deterministic byte representation; family maps and
//! constants cannot be folded.

use crate::definitions::{ElementCount, Endianness, IntegerFormat, StringEncoding};
use crate::error::MappingError;
use crate::runtime::data_maps::{pin_matches, DataTypeMap, StructureMemberMap};
use crate::runtime::value::Value;

impl DataTypeMap {
    /// Fold a value into its encoded byte representation.
    pub fn fold_value(&self, value: &Value) -> Result<Vec<u8>, MappingError> {
        let mut buffer = Vec::new();
        self.fold_into(value, &mut buffer)?;
        Ok(buffer)
    }

    fn fold_into(&self, value: &Value, buffer: &mut Vec<u8>) -> Result<(), MappingError> {
        match self {
            Self::Boolean(map) => {
                let flag = value.as_bool().ok_or_else(|| mismatch(&map.name, value))?;
                let encoded = if flag {
                    map.true_value.unwrap_or(1)
                } else {
                    map.false_value
                };
                write_unsigned(buffer, encoded, map.size, map.endianness);
                Ok(())
            }
            Self::Character(map) => match value {
                Value::Character(character) => {
                    write_unsigned(buffer, u64::from(u32::from(*character)), map.size, map.endianness);
                    Ok(())
                }
                _ => Err(mismatch(&map.name, value)),
            },
            Self::Integer(map) => {
                let encoded = match (map.format, value) {
                    (IntegerFormat::Signed, Value::Integer(number)) => *number as u64,
                    (IntegerFormat::Unsigned, Value::UnsignedInteger(number)) => *number,
                    (IntegerFormat::Unsigned, Value::Integer(number)) if *number >= 0 => {
                        *number as u64
                    }
                    _ => return Err(mismatch(&map.name, value)),
                };
                write_unsigned(buffer, encoded, map.size, map.endianness);
                Ok(())
            }
            Self::FloatingPoint(map) => {
                let number = value.as_f64().ok_or_else(|| mismatch(&map.name, value))?;
                match (map.size, map.endianness) {
                    (4, Endianness::Little) => buffer.extend((number as f32).to_le_bytes()),
                    (4, Endianness::Big) => buffer.extend((number as f32).to_be_bytes()),
                    (8, Endianness::Little) => buffer.extend(number.to_le_bytes()),
                    (_, Endianness::Big) => buffer.extend(number.to_be_bytes()),
                    (_, Endianness::Little) => buffer.extend(number.to_le_bytes()),
                }
                Ok(())
            }
            Self::Uuid(map) => {
                let uuid = value.as_uuid().ok_or_else(|| mismatch(&map.name, value))?;
                match map.endianness {
                    Endianness::Big => buffer.extend(uuid.as_bytes()),
                    Endianness::Little => buffer.extend(uuid.to_bytes_le()),
                }
                Ok(())
            }
            Self::Enumeration(map) => {
                let number = match value {
                    Value::Enum(number, _) => *number,
                    Value::Integer(number) => *number,
                    Value::UnsignedInteger(number) => *number as i64,
                    _ => return Err(mismatch(&map.name, value)),
                };
                write_unsigned(buffer, number as u64, 4, map.endianness);
                Ok(())
            }
            Self::Sequence(map) => {
                let elements = match value {
                    Value::Sequence(elements) => elements,
                    _ => return Err(mismatch(&map.inner.name, value)),
                };
                if let Some(ElementCount::Fixed(count)) = map.inner.number_of_elements {
                    if elements.len() as u64 != count {
                        return Err(MappingError::FoldingUnsupported {
                            name: map.inner.name.clone(),
                            message: format!(
                                "expected {} elements, got {}",
                                count,
                                elements.len()
                            ),
                        });
                    }
                }
                for element in elements {
                    map.inner.element.fold_into(element, buffer)?;
                }
                if let Some(terminator) = &map.inner.terminator {
                    buffer.extend(terminator);
                }
                Ok(())
            }
            Self::Stream(map) => {
                let data = value
                    .as_bytes()
                    .ok_or_else(|| mismatch(&map.inner.name, value))?;
                buffer.extend(data);
                if let Some(terminator) = &map.inner.terminator {
                    buffer.extend(terminator);
                }
                Ok(())
            }
            Self::String(map) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| mismatch(&map.inner.name, value))?;
                encode_text(&map.inner.name, text, map.encoding, buffer)?;
                if let Some(terminator) = &map.inner.terminator {
                    buffer.extend(terminator);
                }
                Ok(())
            }
            Self::Structure(map) => {
                fold_members(&map.name, &map.members, value, buffer)
            }
            Self::Union(map) => {
                let members = match value {
                    Value::Union(members) => members,
                    _ => return Err(mismatch(&map.name, value)),
                };
                // Every member views the same bytes; emit the widest one.
                let mut widest = Vec::new();
                for (member, member_value) in map.members.iter().zip(members) {
                    let mut candidate = Vec::new();
                    member.map.fold_into(member_value, &mut candidate)?;
                    if candidate.len() > widest.len() {
                        widest = candidate;
                    }
                }
                buffer.extend(widest);
                Ok(())
            }
            Self::Format(map) => {
                let start = buffer.len();
                for entry in &map.layout {
                    let entry_value = value.field(&entry.name).ok_or_else(|| {
                        MappingError::FoldingUnsupported {
                            name: map.name.clone(),
                            message: format!("missing layout entry: {}", entry.name),
                        }
                    })?;
                    let target = start + entry.offset;
                    if buffer.len() < target {
                        buffer.resize(target, 0);
                    }
                    entry.map.fold_into(entry_value, buffer)?;
                }
                Ok(())
            }
            Self::StructureGroup(map) => {
                let identifier_value = value.field(&map.identifier).ok_or_else(|| {
                    MappingError::FoldingUnsupported {
                        name: map.name.clone(),
                        message: format!("missing identifier member: {}", map.identifier),
                    }
                })?;
                let variant = map
                    .variants
                    .iter()
                    .find(|variant| {
                        variant
                            .pinned_values
                            .iter()
                            .any(|pin| pin_matches(pin, identifier_value))
                    })
                    .map(|variant| &variant.map)
                    .or(map.default.as_ref())
                    .ok_or_else(|| MappingError::FoldingUnsupported {
                        name: map.name.clone(),
                        message: "no variant matches the identifier value".to_string(),
                    })?;
                variant.fold_into(value, buffer)
            }
            Self::Padding(map) => {
                // Standalone padding aligns relative to the buffer start.
                let padding = map.padding_size(buffer.len());
                match value {
                    Value::Bytes(bytes) if bytes.len() == padding => buffer.extend(bytes),
                    _ => buffer.extend(std::iter::repeat(0u8).take(padding)),
                }
                Ok(())
            }
            Self::Constant(_) | Self::StructureFamily(_) => {
                Err(MappingError::FoldingUnsupported {
                    name: self.name().to_string(),
                    message: format!("{} data types have no byte representation", kind_label(self)),
                })
            }
        }
    }
}

fn fold_members(
    name: &str,
    members: &[StructureMemberMap],
    value: &Value,
    buffer: &mut Vec<u8>,
) -> Result<(), MappingError> {
    let entries = value
        .entries()
        .ok_or_else(|| mismatch(name, value))?;
    let start = buffer.len();

    for member in members {
        let member_value = entries
            .iter()
            .find(|(entry_name, _)| *entry_name == member.name)
            .map(|(_, entry_value)| entry_value);

        let member_value = match member_value {
            Some(member_value) => member_value,
            // A conditional member absent from the value folds to nothing.
            None if member.condition.is_some() => continue,
            None => {
                return Err(MappingError::FoldingUnsupported {
                    name: name.to_string(),
                    message: format!("missing member: {}", member.name),
                })
            }
        };

        match member.map.as_ref() {
            DataTypeMap::Padding(padding) => {
                let size = padding.padding_size(buffer.len() - start);
                match member_value {
                    Value::Bytes(bytes) if bytes.len() == size => buffer.extend(bytes),
                    _ => buffer.extend(std::iter::repeat(0u8).take(size)),
                }
            }
            map => map.fold_into(member_value, buffer)?,
        }
    }
    Ok(())
}

pub(crate) fn write_unsigned(
    buffer: &mut Vec<u8>,
    value: u64,
    size: usize,
    endianness: Endianness,
) {
    let bytes = value.to_le_bytes();
    match endianness {
        Endianness::Little => buffer.extend(&bytes[..size.min(8)]),
        Endianness::Big => buffer.extend(bytes[..size.min(8)].iter().rev()),
    }
}

fn encode_text(
    name: &str,
    text: &str,
    encoding: StringEncoding,
    buffer: &mut Vec<u8>,
) -> Result<(), MappingError> {
    match encoding {
        StringEncoding::Ascii => {
            if !text.is_ascii() {
                return Err(MappingError::InvalidEncoding {
                    name: name.to_string(),
                    offset: 0,
                    message: "text is not ASCII".to_string(),
                });
            }
            buffer.extend(text.as_bytes());
        }
        StringEncoding::Utf8 => buffer.extend(text.as_bytes()),
        StringEncoding::Utf16Le => {
            for unit in text.encode_utf16() {
                buffer.extend(unit.to_le_bytes());
            }
        }
        StringEncoding::Utf16Be => {
            for unit in text.encode_utf16() {
                buffer.extend(unit.to_be_bytes());
            }
        }
    }
    Ok(())
}

fn mismatch(name: &str, value: &Value) -> MappingError {
    MappingError::FoldingUnsupported {
        name: name.to_string(),
        message: format!("value does not match the data type: {:?}", value),
    }
}

fn kind_label(map: &DataTypeMap) -> &'static str {
    match map {
        DataTypeMap::Constant(_) => "constant",
        DataTypeMap::StructureFamily(_) => "structure-family",
        _ => "semantic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_unsigned() {
        let mut buffer = Vec::new();
        write_unsigned(&mut buffer, 0x0102, 2, Endianness::Little);
        assert_eq!(buffer, vec![0x02, 0x01]);

        let mut buffer = Vec::new();
        write_unsigned(&mut buffer, 0x0102, 2, Endianness::Big);
        assert_eq!(buffer, vec![0x01, 0x02]);

        let mut buffer = Vec::new();
        write_unsigned(&mut buffer, u64::MAX, 8, Endianness::Big);
        assert_eq!(buffer, vec![0xff; 8]);
    }

    #[test]
    fn test_encode_text() {
        let mut buffer = Vec::new();
        encode_text("string", "dt", StringEncoding::Utf16Le, &mut buffer).unwrap();
        assert_eq!(buffer, vec![0x64, 0x00, 0x74, 0x00]);

        let mut buffer = Vec::new();
        assert!(encode_text("string", "é", StringEncoding::Ascii, &mut buffer).is_err());
    }
}
