// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Definitions reader.
//!
//! Consumes multi-document YAML streams, validates every document against
//! its kind's attribute schema, registers the resulting definitions, and
//! runs the resolution pass (reference substitution, cycle detection,
//! family and group validation).
//!
//! # Example
//!
//! ```rust
//! use dtfabric::DefinitionsReader;
//!
//! let registry = DefinitionsReader::read(
//!     "name: int32\n\
//!      type: integer\n\
//!      attributes:\n\
//!      \x20 format: signed\n\
//!      \x20 size: 4\n",
//! )?;
//! assert!(registry.lookup("int32").is_some());
//! # Ok::<(), dtfabric::DefinitionError>(())
//! ```

mod resolver;
mod schema;

use crate::definitions::{
    BooleanDefinition, ByteOrder, CharacterDefinition, ConstantDefinition, DataSize,
    DataTypeDefinition, DataTypeRef, DataTypeRegistry, DefinitionKind, ElementCount,
    ElementSequenceDefinition, EnumerationDefinition, EnumerationValue, FixedSizeAttributes,
    FloatingPointDefinition, FormatDefinition, IntegerDefinition, IntegerFormat, LayoutElement,
    MemberDataType, MemberDefinition, PaddingDefinition, PinnedValue, StringDefinition,
    StringEncoding, StructureDefinition, StructureFamilyDefinition, StructureGroupDefinition,
    UnionDefinition, UuidDefinition,
};
use crate::error::DefinitionError;
use crate::expression::Expression;
use schema::{
    AttributesDocument, ByteOrderDocument, DefinitionDocument, IntegerFormatDocument,
    IntegerOrExpression, MemberDocument, MemberEntry, SizeDocument, TypeIndicator,
};
use serde::Deserialize;

/// Reader of YAML data type definition streams.
#[derive(Debug, Default)]
pub struct DefinitionsReader;

impl DefinitionsReader {
    /// Read a YAML definitions stream into a new registry.
    pub fn read(yaml: &str) -> Result<DataTypeRegistry, DefinitionError> {
        let mut registry = DataTypeRegistry::new();
        Self::read_into(yaml, &mut registry)?;
        Ok(registry)
    }

    /// Read a YAML definitions stream into an existing registry and
    /// resolve it.
    ///
    /// Forward references are legal within one stream: resolution runs
    /// after every document has been registered.
    pub fn read_into(yaml: &str, registry: &mut DataTypeRegistry) -> Result<(), DefinitionError> {
        let mut count = 0usize;
        for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let document = DefinitionDocument::deserialize(document)
                .map_err(|source| DefinitionError::Yaml {
                    document: index,
                    source,
                })?;
            let definition = read_definition(document)?;
            registry.register(definition)?;
            count += 1;
        }
        log::debug!("read {} definition documents", count);

        resolver::resolve(registry)
    }
}

fn schema_error(name: &str, message: impl Into<String>) -> DefinitionError {
    DefinitionError::Schema {
        name: name.to_string(),
        message: message.into(),
    }
}

/// Dispatch a document to its kind's reader.
fn read_definition(document: DefinitionDocument) -> Result<DataTypeDefinition, DefinitionError> {
    let kind = match document.type_indicator {
        TypeIndicator::Boolean
        | TypeIndicator::Character
        | TypeIndicator::Integer
        | TypeIndicator::FloatingPoint
        | TypeIndicator::Uuid => read_fixed_size(&document)?,
        TypeIndicator::Sequence | TypeIndicator::Stream | TypeIndicator::String => {
            read_element_sequence_definition(&document)?
        }
        TypeIndicator::Padding => read_padding(&document)?,
        TypeIndicator::Structure | TypeIndicator::Union => read_with_members(&document)?,
        TypeIndicator::Constant => read_constant(&document)?,
        TypeIndicator::Enumeration => read_enumeration(&document)?,
        TypeIndicator::Format => read_format(&document)?,
        TypeIndicator::StructureFamily => read_structure_family(&document)?,
        TypeIndicator::StructureGroup => read_structure_group(&document)?,
    };

    Ok(DataTypeDefinition {
        name: document.name,
        aliases: document.aliases.unwrap_or_default(),
        description: document.description,
        urls: document.urls.unwrap_or_default(),
        kind,
    })
}

// ---------------------------------------------------------------------------
// Attribute presence checks
// ---------------------------------------------------------------------------

/// Reject document attributes a kind does not support.
struct AttributeGuard<'a> {
    document: &'a DefinitionDocument,
    kind: &'static str,
}

impl<'a> AttributeGuard<'a> {
    fn new(document: &'a DefinitionDocument, kind: &'static str) -> Self {
        Self { document, kind }
    }

    fn forbid<T>(&self, field: &Option<T>, label: &str) -> Result<(), DefinitionError> {
        if field.is_some() {
            return Err(schema_error(
                &self.document.name,
                format!("{} not supported by {} data type", label, self.kind),
            ));
        }
        Ok(())
    }

    fn forbid_element_sequence(&self) -> Result<(), DefinitionError> {
        self.forbid(&self.document.element_data_type, "element_data_type")?;
        self.forbid(&self.document.number_of_elements, "number_of_elements")?;
        self.forbid(&self.document.elements_data_size, "elements_data_size")?;
        self.forbid(&self.document.elements_terminator, "elements_terminator")?;
        self.forbid(&self.document.encoding, "encoding")
    }

    fn forbid_composite(&self) -> Result<(), DefinitionError> {
        self.forbid(&self.document.members, "members")?;
        self.forbid(&self.document.layout, "layout")?;
        self.forbid(&self.document.metadata, "metadata")?;
        self.forbid(&self.document.base, "base")?;
        self.forbid(&self.document.identifier, "identifier")?;
        self.forbid(&self.document.default, "default")
    }

    fn forbid_semantic(&self) -> Result<(), DefinitionError> {
        self.forbid(&self.document.value, "value")?;
        self.forbid(&self.document.values, "values")
    }

    fn forbid_padding(&self) -> Result<(), DefinitionError> {
        self.forbid(&self.document.alignment_size, "alignment_size")
    }
}

// ---------------------------------------------------------------------------
// Fixed-size kinds
// ---------------------------------------------------------------------------

fn convert_byte_order(byte_order: Option<ByteOrderDocument>) -> ByteOrder {
    match byte_order {
        Some(ByteOrderDocument::BigEndian) => ByteOrder::BigEndian,
        Some(ByteOrderDocument::LittleEndian) => ByteOrder::LittleEndian,
        Some(ByteOrderDocument::Native) | None => ByteOrder::Native,
    }
}

fn convert_fixed_size_attributes(
    name: &str,
    attributes: &AttributesDocument,
) -> Result<FixedSizeAttributes, DefinitionError> {
    let size = match &attributes.size {
        Some(SizeDocument::Bytes(size)) => DataSize::Bytes(*size),
        Some(SizeDocument::Keyword(keyword)) if keyword == "native" => DataSize::Native,
        Some(SizeDocument::Keyword(keyword)) => {
            return Err(schema_error(
                name,
                format!("unsupported size attribute: {}", keyword),
            ))
        }
        None => DataSize::Native,
    };

    Ok(FixedSizeAttributes {
        byte_order: convert_byte_order(attributes.byte_order),
        size,
        units: attributes
            .units
            .clone()
            .unwrap_or_else(|| "bytes".to_string()),
    })
}

fn read_fixed_size(document: &DefinitionDocument) -> Result<DefinitionKind, DefinitionError> {
    let name = &document.name;
    let guard = AttributeGuard::new(document, "fixed-size");
    guard.forbid_element_sequence()?;
    guard.forbid_composite()?;
    guard.forbid_semantic()?;
    guard.forbid_padding()?;

    let default_attributes = AttributesDocument::default();
    let document_attributes = document.attributes.as_ref().unwrap_or(&default_attributes);
    let mut attributes = convert_fixed_size_attributes(name, document_attributes)?;

    if document.type_indicator != TypeIndicator::Integer && document_attributes.format.is_some() {
        return Err(schema_error(name, "format attribute only supported by integer"));
    }
    if document.type_indicator != TypeIndicator::Boolean
        && (document_attributes.false_value.is_some() || document_attributes.true_value.is_some())
    {
        return Err(schema_error(
            name,
            "false_value and true_value attributes only supported by boolean",
        ));
    }

    Ok(match document.type_indicator {
        TypeIndicator::Boolean => DefinitionKind::Boolean(BooleanDefinition {
            attributes,
            false_value: document_attributes.false_value.unwrap_or(0),
            true_value: document_attributes.true_value,
        }),
        TypeIndicator::Character => DefinitionKind::Character(CharacterDefinition { attributes }),
        TypeIndicator::Integer => DefinitionKind::Integer(IntegerDefinition {
            attributes,
            format: match document_attributes.format {
                Some(IntegerFormatDocument::Unsigned) => IntegerFormat::Unsigned,
                Some(IntegerFormatDocument::Signed) | None => IntegerFormat::Signed,
            },
        }),
        TypeIndicator::FloatingPoint => {
            DefinitionKind::FloatingPoint(FloatingPointDefinition { attributes })
        }
        TypeIndicator::Uuid => {
            if attributes.size == DataSize::Native {
                attributes.size = DataSize::Bytes(16);
            }
            DefinitionKind::Uuid(UuidDefinition { attributes })
        }
        _ => return Err(schema_error(name, "unexpected fixed-size data type")),
    })
}

// ---------------------------------------------------------------------------
// Element sequences
// ---------------------------------------------------------------------------

fn convert_element_count(
    name: &str,
    value: &IntegerOrExpression,
) -> Result<ElementCount, DefinitionError> {
    match value {
        IntegerOrExpression::Integer(count) => Ok(ElementCount::Fixed(*count)),
        IntegerOrExpression::Expression(expression) => Expression::parse(expression)
            .map(ElementCount::Expression)
            .map_err(|source| DefinitionError::ExpressionSyntax {
                name: name.to_string(),
                source,
            }),
    }
}

fn convert_element_sequence(
    name: &str,
    element_data_type: Option<&String>,
    number_of_elements: Option<&IntegerOrExpression>,
    elements_data_size: Option<&IntegerOrExpression>,
    elements_terminator: Option<&schema::TerminatorDocument>,
) -> Result<ElementSequenceDefinition, DefinitionError> {
    let element_data_type = element_data_type
        .ok_or_else(|| schema_error(name, "missing element data type"))?
        .clone();

    if number_of_elements.is_some() && elements_data_size.is_some() {
        return Err(schema_error(
            name,
            "number of elements and elements data size not allowed at the same time",
        ));
    }
    if number_of_elements.is_none()
        && elements_data_size.is_none()
        && elements_terminator.is_none()
    {
        return Err(schema_error(
            name,
            "missing number of elements, elements data size and elements terminator",
        ));
    }

    Ok(ElementSequenceDefinition {
        element_data_type: DataTypeRef::Named(element_data_type),
        number_of_elements: number_of_elements
            .map(|value| convert_element_count(name, value))
            .transpose()?,
        elements_data_size: elements_data_size
            .map(|value| convert_element_count(name, value))
            .transpose()?,
        elements_terminator: elements_terminator
            .map(schema::TerminatorDocument::to_bytes),
    })
}

fn read_element_sequence_definition(
    document: &DefinitionDocument,
) -> Result<DefinitionKind, DefinitionError> {
    let name = &document.name;
    let guard = AttributeGuard::new(document, "element sequence");
    guard.forbid(&document.attributes, "attributes")?;
    guard.forbid_composite()?;
    guard.forbid_semantic()?;
    guard.forbid_padding()?;

    let sequence = convert_element_sequence(
        name,
        document.element_data_type.as_ref(),
        document.number_of_elements.as_ref(),
        document.elements_data_size.as_ref(),
        document.elements_terminator.as_ref(),
    )?;

    match document.type_indicator {
        TypeIndicator::Sequence => {
            if document.encoding.is_some() {
                return Err(schema_error(name, "encoding not supported by sequence data type"));
            }
            Ok(DefinitionKind::Sequence(sequence))
        }
        TypeIndicator::Stream => {
            if document.encoding.is_some() {
                return Err(schema_error(name, "encoding not supported by stream data type"));
            }
            Ok(DefinitionKind::Stream(sequence))
        }
        TypeIndicator::String => {
            let encoding = document
                .encoding
                .as_deref()
                .ok_or_else(|| schema_error(name, "missing encoding"))?;
            let encoding = StringEncoding::from_name(encoding).ok_or_else(|| {
                schema_error(name, format!("unsupported encoding: {}", encoding))
            })?;
            Ok(DefinitionKind::String(StringDefinition { sequence, encoding }))
        }
        _ => Err(schema_error(name, "unexpected element sequence data type")),
    }
}

// ---------------------------------------------------------------------------
// Padding
// ---------------------------------------------------------------------------

const SUPPORTED_ALIGNMENT_SIZES: [u64; 4] = [2, 4, 8, 16];

fn convert_padding(name: &str, alignment_size: Option<u64>) -> Result<DefinitionKind, DefinitionError> {
    let alignment_size =
        alignment_size.ok_or_else(|| schema_error(name, "missing alignment size"))?;
    if !SUPPORTED_ALIGNMENT_SIZES.contains(&alignment_size) {
        return Err(schema_error(
            name,
            format!("unsupported alignment size: {}", alignment_size),
        ));
    }
    Ok(DefinitionKind::Padding(PaddingDefinition { alignment_size }))
}

fn read_padding(document: &DefinitionDocument) -> Result<DefinitionKind, DefinitionError> {
    let guard = AttributeGuard::new(document, "padding");
    guard.forbid(&document.attributes, "attributes")?;
    guard.forbid_element_sequence()?;
    guard.forbid_composite()?;
    guard.forbid_semantic()?;

    convert_padding(&document.name, document.alignment_size)
}

// ---------------------------------------------------------------------------
// Structures and unions
// ---------------------------------------------------------------------------

fn read_with_members(document: &DefinitionDocument) -> Result<DefinitionKind, DefinitionError> {
    let name = &document.name;
    let is_union = document.type_indicator == TypeIndicator::Union;
    let guard = AttributeGuard::new(document, if is_union { "union" } else { "structure" });
    guard.forbid(&document.attributes, "attributes")?;
    guard.forbid_element_sequence()?;
    guard.forbid_semantic()?;
    guard.forbid_padding()?;
    guard.forbid(&document.layout, "layout")?;
    guard.forbid(&document.metadata, "metadata")?;
    guard.forbid(&document.base, "base")?;
    guard.forbid(&document.identifier, "identifier")?;
    guard.forbid(&document.default, "default")?;

    let entries = document
        .members
        .as_ref()
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| schema_error(name, "missing members"))?;

    let mut members = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let member = match entry {
            MemberEntry::Member(member) => member,
            MemberEntry::Name(_) => {
                return Err(schema_error(name, "invalid member definition"))
            }
        };
        members.push(read_member(name, is_union, index, member)?);
    }

    if is_union {
        Ok(DefinitionKind::Union(UnionDefinition { members }))
    } else {
        Ok(DefinitionKind::Structure(StructureDefinition { members }))
    }
}

/// Inline member kinds; everything else must be a named reference.
const INLINE_MEMBER_KINDS: [TypeIndicator; 4] = [
    TypeIndicator::Sequence,
    TypeIndicator::Stream,
    TypeIndicator::String,
    TypeIndicator::Padding,
];

fn read_member(
    parent: &str,
    parent_is_union: bool,
    index: usize,
    document: &MemberDocument,
) -> Result<MemberDefinition, DefinitionError> {
    let label = match &document.name {
        Some(member_name) => format!("{}.{}", parent, member_name),
        None => format!("{}.member{}", parent, index),
    };

    if !parent_is_union && document.name.is_none() {
        return Err(schema_error(&label, "missing member name"));
    }
    if document.value.is_some() && document.values.is_some() {
        return Err(schema_error(
            &label,
            "value and values not allowed at the same time",
        ));
    }

    let data_type = match (&document.data_type, document.type_indicator) {
        (Some(_), Some(_)) => {
            return Err(schema_error(
                &label,
                "data_type and type not allowed at the same time",
            ))
        }
        (None, None) => return Err(schema_error(&label, "missing data_type or type")),
        (Some(reference), None) => {
            // Inline-only attributes are meaningless on a reference.
            if document.element_data_type.is_some()
                || document.number_of_elements.is_some()
                || document.elements_data_size.is_some()
                || document.elements_terminator.is_some()
                || document.encoding.is_some()
                || document.alignment_size.is_some()
            {
                return Err(schema_error(
                    &label,
                    "inline attributes not supported with data_type",
                ));
            }
            MemberDataType::Reference(DataTypeRef::Named(reference.clone()))
        }
        (None, Some(indicator)) => {
            if !INLINE_MEMBER_KINDS.contains(&indicator) {
                return Err(schema_error(
                    &label,
                    "only sequence, stream, string and padding can be defined inline",
                ));
            }
            MemberDataType::Inline(Box::new(read_inline_member_type(
                &label, indicator, document,
            )?))
        }
    };

    let condition = document
        .condition
        .as_deref()
        .map(|condition| {
            Expression::parse(condition).map_err(|source| DefinitionError::ExpressionSyntax {
                name: label.clone(),
                source,
            })
        })
        .transpose()?;

    let mut pinned_values = Vec::new();
    if let Some(value) = &document.value {
        pinned_values.push(read_pinned_value(&label, value)?);
    }
    if let Some(values) = &document.values {
        for value in values {
            pinned_values.push(read_pinned_value(&label, value)?);
        }
    }

    Ok(MemberDefinition {
        name: document.name.clone(),
        aliases: document.aliases.clone().unwrap_or_default(),
        description: document.description.clone(),
        condition,
        data_type,
        pinned_values,
    })
}

fn read_inline_member_type(
    label: &str,
    indicator: TypeIndicator,
    document: &MemberDocument,
) -> Result<DataTypeDefinition, DefinitionError> {
    let kind = match indicator {
        TypeIndicator::Padding => convert_padding(label, document.alignment_size)?,
        TypeIndicator::Sequence | TypeIndicator::Stream | TypeIndicator::String => {
            let sequence = convert_element_sequence(
                label,
                document.element_data_type.as_ref(),
                document.number_of_elements.as_ref(),
                document.elements_data_size.as_ref(),
                document.elements_terminator.as_ref(),
            )?;
            match indicator {
                TypeIndicator::Sequence => DefinitionKind::Sequence(sequence),
                TypeIndicator::Stream => DefinitionKind::Stream(sequence),
                TypeIndicator::String => {
                    let encoding = document
                        .encoding
                        .as_deref()
                        .ok_or_else(|| schema_error(label, "missing encoding"))?;
                    let encoding = StringEncoding::from_name(encoding).ok_or_else(|| {
                        schema_error(label, format!("unsupported encoding: {}", encoding))
                    })?;
                    DefinitionKind::String(StringDefinition { sequence, encoding })
                }
                _ => return Err(schema_error(label, "unexpected inline member type")),
            }
        }
        _ => return Err(schema_error(label, "unexpected inline member type")),
    };

    Ok(DataTypeDefinition::new(label, kind))
}

fn read_pinned_value(
    name: &str,
    value: &serde_yaml::Value,
) -> Result<PinnedValue, DefinitionError> {
    match value {
        serde_yaml::Value::Number(number) => number
            .as_i64()
            .map(PinnedValue::Integer)
            .ok_or_else(|| schema_error(name, format!("unsupported value: {}", number))),
        serde_yaml::Value::String(text) => Ok(PinnedValue::String(text.clone())),
        serde_yaml::Value::Bool(flag) => Ok(PinnedValue::Integer(i64::from(*flag))),
        other => Err(schema_error(name, format!("unsupported value: {:?}", other))),
    }
}

// ---------------------------------------------------------------------------
// Semantic kinds
// ---------------------------------------------------------------------------

fn read_constant(document: &DefinitionDocument) -> Result<DefinitionKind, DefinitionError> {
    let name = &document.name;
    let guard = AttributeGuard::new(document, "constant");
    guard.forbid(&document.attributes, "attributes")?;
    guard.forbid_element_sequence()?;
    guard.forbid_composite()?;
    guard.forbid_padding()?;
    guard.forbid(&document.values, "values")?;

    let value = document
        .value
        .as_ref()
        .ok_or_else(|| schema_error(name, "missing value"))?;
    let value = value
        .as_i64()
        .ok_or_else(|| schema_error(name, "unsupported constant value"))?;

    Ok(DefinitionKind::Constant(ConstantDefinition { value }))
}

fn read_enumeration(document: &DefinitionDocument) -> Result<DefinitionKind, DefinitionError> {
    let name = &document.name;
    let guard = AttributeGuard::new(document, "enumeration");
    guard.forbid_element_sequence()?;
    guard.forbid_composite()?;
    guard.forbid_padding()?;
    guard.forbid(&document.value, "value")?;

    let byte_order = match &document.attributes {
        Some(attributes) => {
            if attributes.size.is_some()
                || attributes.units.is_some()
                || attributes.format.is_some()
                || attributes.false_value.is_some()
                || attributes.true_value.is_some()
            {
                return Err(schema_error(
                    name,
                    "only the byte_order attribute is supported by enumeration",
                ));
            }
            convert_byte_order(attributes.byte_order)
        }
        None => ByteOrder::Native,
    };

    let entries = document
        .values
        .as_ref()
        .filter(|values| !values.is_empty())
        .ok_or_else(|| schema_error(name, "missing values"))?;

    let mut enumeration = EnumerationDefinition {
        values: Vec::with_capacity(entries.len()),
        byte_order,
    };
    for entry in entries {
        if enumeration
            .values
            .iter()
            .any(|value| value.name == entry.name)
        {
            return Err(schema_error(
                name,
                format!("value with name: {} already exists", entry.name),
            ));
        }
        if enumeration
            .values
            .iter()
            .any(|value| value.number == entry.number)
        {
            return Err(schema_error(
                name,
                format!("value with number: {} already exists", entry.number),
            ));
        }
        for alias in entry.aliases.iter().flatten() {
            if enumeration
                .values
                .iter()
                .any(|value| value.aliases.iter().any(|existing| existing == alias))
            {
                return Err(schema_error(
                    name,
                    format!("value with alias: {} already exists", alias),
                ));
            }
        }

        enumeration.values.push(EnumerationValue {
            name: entry.name.clone(),
            number: entry.number,
            aliases: entry.aliases.clone().unwrap_or_default(),
            description: entry.description.clone(),
        });
    }

    Ok(DefinitionKind::Enumeration(enumeration))
}

// ---------------------------------------------------------------------------
// Layout kinds
// ---------------------------------------------------------------------------

fn read_format(document: &DefinitionDocument) -> Result<DefinitionKind, DefinitionError> {
    let guard = AttributeGuard::new(document, "format");
    guard.forbid(&document.attributes, "attributes")?;
    guard.forbid_element_sequence()?;
    guard.forbid_semantic()?;
    guard.forbid_padding()?;
    guard.forbid(&document.members, "members")?;
    guard.forbid(&document.base, "base")?;
    guard.forbid(&document.identifier, "identifier")?;
    guard.forbid(&document.default, "default")?;

    let layout = document
        .layout
        .iter()
        .flatten()
        .map(|entry| LayoutElement {
            data_type: DataTypeRef::Named(entry.data_type.clone()),
            offset: entry.offset,
        })
        .collect();

    Ok(DefinitionKind::Format(FormatDefinition {
        layout,
        metadata: document.metadata.clone(),
    }))
}

fn member_names(
    document: &DefinitionDocument,
    kind: &'static str,
) -> Result<Vec<DataTypeRef>, DefinitionError> {
    let entries = document
        .members
        .as_ref()
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| schema_error(&document.name, "missing members"))?;

    entries
        .iter()
        .map(|entry| match entry {
            MemberEntry::Name(member_name) => Ok(DataTypeRef::Named(member_name.clone())),
            MemberEntry::Member(_) => Err(schema_error(
                &document.name,
                format!("{} members must be structure names", kind),
            )),
        })
        .collect()
}

fn read_structure_family(
    document: &DefinitionDocument,
) -> Result<DefinitionKind, DefinitionError> {
    let guard = AttributeGuard::new(document, "structure-family");
    guard.forbid(&document.attributes, "attributes")?;
    guard.forbid_element_sequence()?;
    guard.forbid_semantic()?;
    guard.forbid_padding()?;
    guard.forbid(&document.layout, "layout")?;
    guard.forbid(&document.metadata, "metadata")?;
    guard.forbid(&document.identifier, "identifier")?;
    guard.forbid(&document.default, "default")?;

    let base = document
        .base
        .as_ref()
        .ok_or_else(|| schema_error(&document.name, "missing base"))?;

    Ok(DefinitionKind::StructureFamily(StructureFamilyDefinition {
        base: DataTypeRef::Named(base.clone()),
        members: member_names(document, "structure-family")?,
    }))
}

fn read_structure_group(
    document: &DefinitionDocument,
) -> Result<DefinitionKind, DefinitionError> {
    let guard = AttributeGuard::new(document, "structure-group");
    guard.forbid(&document.attributes, "attributes")?;
    guard.forbid_element_sequence()?;
    guard.forbid_semantic()?;
    guard.forbid_padding()?;
    guard.forbid(&document.layout, "layout")?;
    guard.forbid(&document.metadata, "metadata")?;

    let base = document
        .base
        .as_ref()
        .ok_or_else(|| schema_error(&document.name, "missing base"))?;
    let identifier = document
        .identifier
        .as_ref()
        .ok_or_else(|| schema_error(&document.name, "missing identifier"))?;

    Ok(DefinitionKind::StructureGroup(StructureGroupDefinition {
        base: DataTypeRef::Named(base.clone()),
        identifier: identifier.clone(),
        members: member_names(document, "structure-group")?,
        default: document
            .default
            .as_ref()
            .map(|default| DataTypeRef::Named(default.clone())),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integer_definition() {
        let registry = DefinitionsReader::read(
            "name: int32le\n\
             type: integer\n\
             aliases: [LONG, LONG32]\n\
             attributes:\n\
             \x20 byte_order: little-endian\n\
             \x20 format: signed\n\
             \x20 size: 4\n",
        )
        .unwrap();

        let definition = registry.lookup("int32le").unwrap();
        assert_eq!(definition.type_indicator(), "integer");
        assert!(registry.lookup("LONG32").is_some());
    }

    #[test]
    fn test_read_rejects_unknown_type() {
        let result = DefinitionsReader::read("name: x\ntype: quantum\n");
        assert!(matches!(result, Err(DefinitionError::Yaml { document: 0, .. })));
    }

    #[test]
    fn test_read_rejects_members_on_integer() {
        let result = DefinitionsReader::read(
            "name: int8\n\
             type: integer\n\
             attributes:\n\
             \x20 size: 1\n\
             members:\n\
             - name: x\n\
             \x20 data_type: int8\n",
        );
        assert!(matches!(result, Err(DefinitionError::Schema { .. })));
    }

    #[test]
    fn test_read_sequence_requires_extent() {
        let result = DefinitionsReader::read(
            "name: int32\n\
             type: integer\n\
             attributes: {size: 4}\n\
             ---\n\
             name: values\n\
             type: sequence\n\
             element_data_type: int32\n",
        );
        assert!(matches!(
            result,
            Err(DefinitionError::Schema { name, .. }) if name == "values"
        ));
    }

    #[test]
    fn test_read_sequence_rejects_count_and_size() {
        let result = DefinitionsReader::read(
            "name: int32\n\
             type: integer\n\
             attributes: {size: 4}\n\
             ---\n\
             name: values\n\
             type: sequence\n\
             element_data_type: int32\n\
             number_of_elements: 4\n\
             elements_data_size: 16\n",
        );
        assert!(matches!(result, Err(DefinitionError::Schema { .. })));
    }

    #[test]
    fn test_read_sequence_allows_terminator_with_count() {
        // Allowed since format revision 20200621.
        let registry = DefinitionsReader::read(
            "name: int32\n\
             type: integer\n\
             attributes: {size: 4}\n\
             ---\n\
             name: values\n\
             type: sequence\n\
             element_data_type: int32\n\
             number_of_elements: 4\n\
             elements_terminator: 0\n",
        )
        .unwrap();
        assert!(registry.lookup("values").is_some());
    }

    #[test]
    fn test_read_member_requires_single_data_type() {
        let result = DefinitionsReader::read(
            "name: int32\n\
             type: integer\n\
             attributes: {size: 4}\n\
             ---\n\
             name: broken\n\
             type: structure\n\
             members:\n\
             - name: x\n",
        );
        assert!(matches!(
            result,
            Err(DefinitionError::Schema { name, .. }) if name == "broken.x"
        ));
    }

    #[test]
    fn test_read_string_requires_encoding() {
        let result = DefinitionsReader::read(
            "name: char\n\
             type: character\n\
             attributes: {size: 1}\n\
             ---\n\
             name: text\n\
             type: string\n\
             element_data_type: char\n\
             elements_terminator: \"\\x00\"\n",
        );
        assert!(matches!(
            result,
            Err(DefinitionError::Schema { name, .. }) if name == "text"
        ));
    }

    #[test]
    fn test_read_constant() {
        let registry = DefinitionsReader::read(
            "name: maximum_number_of_back_traces\n\
             type: constant\n\
             value: 32\n",
        )
        .unwrap();
        let definition = registry.lookup("maximum_number_of_back_traces").unwrap();
        assert!(matches!(
            definition.kind,
            DefinitionKind::Constant(ConstantDefinition { value: 32 })
        ));
    }

    #[test]
    fn test_read_enumeration_rejects_duplicate_number() {
        let result = DefinitionsReader::read(
            "name: file_types\n\
             type: enumeration\n\
             values:\n\
             - name: FIFO\n\
             \x20 number: 1\n\
             - name: CHR\n\
             \x20 number: 1\n",
        );
        assert!(matches!(result, Err(DefinitionError::Schema { .. })));
    }

    #[test]
    fn test_forward_references_resolve() {
        let registry = DefinitionsReader::read(
            "name: point3d\n\
             type: structure\n\
             members:\n\
             - name: x\n\
             \x20 data_type: int32\n\
             ---\n\
             name: int32\n\
             type: integer\n\
             attributes: {size: 4}\n",
        )
        .unwrap();
        assert!(registry.is_resolved());
    }
}
