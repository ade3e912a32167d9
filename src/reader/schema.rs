// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML-deserializable definition document shapes.
//!
//! These types describe one YAML document of a definitions file. They are
//! deserialized with serde and then validated and converted into the
//! definition model by the reader. Unknown attributes are rejected by the
//! deserializer itself.

use serde::Deserialize;

/// The `type` tag of a definition document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) enum TypeIndicator {
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "character")]
    Character,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "floating-point")]
    FloatingPoint,
    #[serde(rename = "uuid")]
    Uuid,
    #[serde(rename = "sequence")]
    Sequence,
    #[serde(rename = "stream")]
    Stream,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "padding")]
    Padding,
    #[serde(rename = "structure")]
    Structure,
    #[serde(rename = "union")]
    Union,
    #[serde(rename = "constant")]
    Constant,
    #[serde(rename = "enumeration")]
    Enumeration,
    #[serde(rename = "format")]
    Format,
    #[serde(rename = "structure-family")]
    StructureFamily,
    #[serde(rename = "structure-group")]
    StructureGroup,
}

/// Byte-order attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) enum ByteOrderDocument {
    #[serde(rename = "big-endian")]
    BigEndian,
    #[serde(rename = "little-endian")]
    LittleEndian,
    #[serde(rename = "native")]
    Native,
}

/// Integer format attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) enum IntegerFormatDocument {
    #[serde(rename = "signed")]
    Signed,
    #[serde(rename = "unsigned")]
    Unsigned,
}

/// Size attribute: a byte count or the literal `native`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum SizeDocument {
    Bytes(u64),
    Keyword(String),
}

/// Count or size attribute: an integer literal or an expression string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum IntegerOrExpression {
    Integer(u64),
    Expression(String),
}

/// Terminator attribute: an element value or a byte string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum TerminatorDocument {
    Integer(u64),
    Text(String),
}

impl TerminatorDocument {
    /// Render to raw bytes; integer terminators use the shortest
    /// little-endian form and are widened to the element size when the
    /// map is built.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        match self {
            TerminatorDocument::Integer(value) => {
                let bytes = value.to_le_bytes();
                let length = (8 - value.leading_zeros() as usize / 8).max(1);
                bytes[..length].to_vec()
            }
            TerminatorDocument::Text(text) => byte_string(text),
        }
    }
}

/// Render an escaped YAML string to raw bytes.
///
/// `"\x00\xff"` style escapes parse to code points U+0000..U+00FF; those
/// map one-to-one onto bytes. Code points beyond U+00FF fall back to
/// their UTF-8 form.
pub(crate) fn byte_string(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for character in text.chars() {
        match u8::try_from(u32::from(character)) {
            Ok(byte) => bytes.push(byte),
            Err(_) => {
                let mut buffer = [0u8; 4];
                bytes.extend(character.encode_utf8(&mut buffer).as_bytes());
            }
        }
    }
    bytes
}

/// The `attributes` mapping of fixed-size and semantic data types.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AttributesDocument {
    pub(crate) byte_order: Option<ByteOrderDocument>,
    pub(crate) size: Option<SizeDocument>,
    pub(crate) units: Option<String>,
    pub(crate) format: Option<IntegerFormatDocument>,
    pub(crate) false_value: Option<u64>,
    pub(crate) true_value: Option<u64>,
}

/// One enumeration value entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EnumerationValueDocument {
    pub(crate) name: String,
    pub(crate) number: i64,
    pub(crate) aliases: Option<Vec<String>>,
    pub(crate) description: Option<String>,
}

/// One structure or union member entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MemberDocument {
    pub(crate) name: Option<String>,
    pub(crate) aliases: Option<Vec<String>>,
    pub(crate) description: Option<String>,
    pub(crate) data_type: Option<String>,
    #[serde(rename = "type")]
    pub(crate) type_indicator: Option<TypeIndicator>,
    pub(crate) condition: Option<String>,
    pub(crate) value: Option<serde_yaml::Value>,
    pub(crate) values: Option<Vec<serde_yaml::Value>>,
    // Inline element-sequence and padding attributes.
    pub(crate) element_data_type: Option<String>,
    pub(crate) number_of_elements: Option<IntegerOrExpression>,
    pub(crate) elements_data_size: Option<IntegerOrExpression>,
    pub(crate) elements_terminator: Option<TerminatorDocument>,
    pub(crate) encoding: Option<String>,
    pub(crate) alignment_size: Option<u64>,
}

/// A `members` entry: a mapping for structures and unions, a plain
/// definition name for structure families and groups.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MemberEntry {
    Name(String),
    Member(Box<MemberDocument>),
}

/// One format layout entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LayoutDocument {
    pub(crate) data_type: String,
    #[serde(default)]
    pub(crate) offset: u64,
}

/// A complete definition document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DefinitionDocument {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) type_indicator: TypeIndicator,
    pub(crate) aliases: Option<Vec<String>>,
    pub(crate) description: Option<String>,
    pub(crate) urls: Option<Vec<String>>,
    pub(crate) attributes: Option<AttributesDocument>,
    // Element sequences.
    pub(crate) element_data_type: Option<String>,
    pub(crate) number_of_elements: Option<IntegerOrExpression>,
    pub(crate) elements_data_size: Option<IntegerOrExpression>,
    pub(crate) elements_terminator: Option<TerminatorDocument>,
    pub(crate) encoding: Option<String>,
    // Padding.
    pub(crate) alignment_size: Option<u64>,
    // Constants.
    pub(crate) value: Option<serde_yaml::Value>,
    // Enumerations.
    pub(crate) values: Option<Vec<EnumerationValueDocument>>,
    // Structures, unions, families, and groups.
    pub(crate) members: Option<Vec<MemberEntry>>,
    // Formats.
    pub(crate) layout: Option<Vec<LayoutDocument>>,
    pub(crate) metadata: Option<serde_yaml::Mapping>,
    // Structure families and groups.
    pub(crate) base: Option<String>,
    pub(crate) identifier: Option<String>,
    pub(crate) default: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_deserialize_fixed_size_document() {
        let yaml = "\
name: int32le
type: integer
attributes:
  byte_order: little-endian
  format: signed
  size: 4
";
        let document: DefinitionDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(document.name, "int32le");
        assert_eq!(document.type_indicator, TypeIndicator::Integer);
        let attributes = document.attributes.unwrap();
        assert_eq!(attributes.byte_order, Some(ByteOrderDocument::LittleEndian));
        assert_eq!(attributes.size, Some(SizeDocument::Bytes(4)));
        assert_eq!(attributes.format, Some(IntegerFormatDocument::Signed));
    }

    #[test]
    fn test_deserialize_rejects_unknown_attribute() {
        let yaml = "\
name: int32le
type: integer
bogus: 1
";
        assert!(serde_yaml::from_str::<DefinitionDocument>(yaml).is_err());
    }

    #[test]
    fn test_deserialize_sequence_with_expression() {
        let yaml = "\
name: triangles
type: sequence
element_data_type: triangle3d
number_of_elements: sphere3d.number_of_triangles
";
        let document: DefinitionDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            document.number_of_elements,
            Some(IntegerOrExpression::Expression(
                "sphere3d.number_of_triangles".to_string()
            ))
        );
    }

    #[test]
    fn test_multi_document_stream() {
        let yaml = "\
name: int32
type: integer
attributes:
  size: 4
---
name: point3d
type: structure
members:
- name: x
  data_type: int32
";
        let mut names = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let document = DefinitionDocument::deserialize(document).unwrap();
            names.push(document.name);
        }
        assert_eq!(names, vec!["int32".to_string(), "point3d".to_string()]);
    }

    #[test]
    fn test_terminator_to_bytes() {
        assert_eq!(TerminatorDocument::Integer(0).to_bytes(), vec![0x00]);
        assert_eq!(
            TerminatorDocument::Integer(0x0a0d).to_bytes(),
            vec![0x0d, 0x0a]
        );
        assert_eq!(
            TerminatorDocument::Text("\u{0}".to_string()).to_bytes(),
            vec![0x00]
        );
        // "\xff" escapes parse to U+00FF and render as single bytes.
        assert_eq!(
            TerminatorDocument::Text("\u{ff}\u{ff}".to_string()).to_bytes(),
            vec![0xff, 0xff]
        );
    }
}
