// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data type definitions.
//!
//! The typed object graph a schema reads into: one [`DefinitionKind`]
//! variant per data-type kind, with the attributes that kind carries.
//! References to other definitions are held as [`DataTypeRef`] values:
//! names after reading, arena indices after resolution.

use crate::definitions::registry::DataTypeRegistry;
use crate::expression::Expression;

/// Identifier of a definition inside a registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefinitionId(pub(crate) usize);

/// Reference to another definition.
///
/// Readers produce named references; the resolution pass replaces them
/// with direct arena indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataTypeRef {
    /// Unresolved reference by definition name.
    Named(String),
    /// Resolved reference into the registry arena.
    Resolved(DefinitionId),
}

impl DataTypeRef {
    /// The resolved identifier, if resolution has run.
    pub fn id(&self) -> Option<DefinitionId> {
        match self {
            DataTypeRef::Resolved(id) => Some(*id),
            DataTypeRef::Named(_) => None,
        }
    }

    /// The referenced name, if still unresolved.
    pub fn name(&self) -> Option<&str> {
        match self {
            DataTypeRef::Named(name) => Some(name),
            DataTypeRef::Resolved(_) => None,
        }
    }
}

/// Declared byte order of a storage data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
    #[default]
    Native,
}

impl ByteOrder {
    /// Resolve to a concrete endianness, substituting the host order for
    /// `native`.
    pub fn resolve(self, native: Endianness) -> Endianness {
        match self {
            ByteOrder::BigEndian => Endianness::Big,
            ByteOrder::LittleEndian => Endianness::Little,
            ByteOrder::Native => native,
        }
    }
}

/// Concrete endianness after `native` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// The host byte order, resolved once per process.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Size attribute of a fixed-size data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSize {
    /// Explicit size in the declared units.
    Bytes(u64),
    /// Unspecified, left to the platform. Rejected at resolution for
    /// kinds that must map onto a byte stream.
    #[default]
    Native,
}

/// Attributes shared by every fixed-size storage kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSizeAttributes {
    pub byte_order: ByteOrder,
    pub size: DataSize,
    pub units: String,
}

impl Default for FixedSizeAttributes {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Native,
            size: DataSize::Native,
            units: "bytes".to_string(),
        }
    }
}

impl FixedSizeAttributes {
    /// Size in bytes, `None` when the size is native or the units are not
    /// bytes.
    pub fn byte_size(&self) -> Option<u64> {
        match self.size {
            DataSize::Bytes(size) if self.units == "bytes" => Some(size),
            _ => None,
        }
    }
}

/// Signedness of an integer data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerFormat {
    #[default]
    Signed,
    Unsigned,
}

/// Boolean data type definition.
#[derive(Debug, Clone)]
pub struct BooleanDefinition {
    pub attributes: FixedSizeAttributes,
    /// Value decoded as `false`.
    pub false_value: u64,
    /// Value decoded as `true`; unset accepts any value other than
    /// `false_value`.
    pub true_value: Option<u64>,
}

/// Character data type definition.
#[derive(Debug, Clone)]
pub struct CharacterDefinition {
    pub attributes: FixedSizeAttributes,
}

/// Integer data type definition.
#[derive(Debug, Clone)]
pub struct IntegerDefinition {
    pub attributes: FixedSizeAttributes,
    pub format: IntegerFormat,
}

/// Floating-point data type definition.
#[derive(Debug, Clone)]
pub struct FloatingPointDefinition {
    pub attributes: FixedSizeAttributes,
}

/// UUID (or GUID) data type definition.
#[derive(Debug, Clone)]
pub struct UuidDefinition {
    pub attributes: FixedSizeAttributes,
}

/// Count or size attribute of an element sequence: a literal or an
/// expression evaluated against the map context.
#[derive(Debug, Clone)]
pub enum ElementCount {
    Fixed(u64),
    Expression(Expression),
}

/// Attributes shared by sequence, stream, and string definitions.
#[derive(Debug, Clone)]
pub struct ElementSequenceDefinition {
    pub element_data_type: DataTypeRef,
    pub number_of_elements: Option<ElementCount>,
    pub elements_data_size: Option<ElementCount>,
    /// Element value that ends the run, as raw bytes.
    pub elements_terminator: Option<Vec<u8>>,
}

/// Text encoding of a string data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    Ascii,
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl StringEncoding {
    /// Parse an encoding attribute value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ascii" => Some(StringEncoding::Ascii),
            "utf-8" | "utf8" => Some(StringEncoding::Utf8),
            "utf-16-le" | "utf-16le" => Some(StringEncoding::Utf16Le),
            "utf-16-be" | "utf-16be" => Some(StringEncoding::Utf16Be),
            _ => None,
        }
    }
}

/// String data type definition.
#[derive(Debug, Clone)]
pub struct StringDefinition {
    pub sequence: ElementSequenceDefinition,
    pub encoding: StringEncoding,
}

/// Padding data type definition.
#[derive(Debug, Clone)]
pub struct PaddingDefinition {
    /// Member boundary is advanced to the next multiple of this size,
    /// relative to the containing structure's start.
    pub alignment_size: u64,
}

/// Expected byte pattern pinned onto a member with `value` or `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinnedValue {
    Integer(i64),
    String(String),
    Bytes(Vec<u8>),
}

impl std::fmt::Display for PinnedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinnedValue::Integer(value) => write!(f, "{}", value),
            PinnedValue::String(value) => write!(f, "{:?}", value),
            PinnedValue::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// Data type of a structure or union member.
#[derive(Debug, Clone)]
pub enum MemberDataType {
    /// Named reference to a registered definition.
    Reference(DataTypeRef),
    /// Anonymous inline definition; only sequence, stream, string, and
    /// padding may be declared inline.
    Inline(Box<DataTypeDefinition>),
}

/// Member of a structure or union definition.
#[derive(Debug, Clone)]
pub struct MemberDefinition {
    /// Member name; optional only inside a union.
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    /// Boolean expression gating the member's presence.
    pub condition: Option<Expression>,
    pub data_type: MemberDataType,
    /// Accepted byte patterns; a single pinned `value` is stored as a
    /// one-element set.
    pub pinned_values: Vec<PinnedValue>,
}

impl MemberDefinition {
    /// Member name for error reporting.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Structure data type definition: ordered members.
#[derive(Debug, Clone)]
pub struct StructureDefinition {
    pub members: Vec<MemberDefinition>,
}

impl StructureDefinition {
    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDefinition> {
        self.members
            .iter()
            .find(|member| member.name.as_deref() == Some(name))
    }
}

/// Union data type definition: members sharing an offset.
#[derive(Debug, Clone)]
pub struct UnionDefinition {
    pub members: Vec<MemberDefinition>,
}

/// Constant data type definition.
#[derive(Debug, Clone)]
pub struct ConstantDefinition {
    pub value: i64,
}

/// A single enumeration value.
#[derive(Debug, Clone)]
pub struct EnumerationValue {
    pub name: String,
    pub number: i64,
    pub aliases: Vec<String>,
    pub description: Option<String>,
}

/// Enumeration data type definition.
#[derive(Debug, Clone)]
pub struct EnumerationDefinition {
    pub values: Vec<EnumerationValue>,
    pub byte_order: ByteOrder,
}

impl EnumerationDefinition {
    /// Symbolic name for a number, if declared.
    pub fn name_for_number(&self, number: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|value| value.number == number)
            .map(|value| value.name.as_str())
    }

    /// Number for a symbolic name or alias.
    pub fn number_for_name(&self, name: &str) -> Option<i64> {
        self.values
            .iter()
            .find(|value| value.name == name || value.aliases.iter().any(|alias| alias == name))
            .map(|value| value.number)
    }
}

/// Entry in a format layout.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub data_type: DataTypeRef,
    /// Absolute byte offset of the entry.
    pub offset: u64,
}

/// Top-level format descriptor.
#[derive(Debug, Clone)]
pub struct FormatDefinition {
    pub layout: Vec<LayoutElement>,
    pub metadata: Option<serde_yaml::Mapping>,
}

/// Structure family: variant structures sharing a base structure.
#[derive(Debug, Clone)]
pub struct StructureFamilyDefinition {
    pub base: DataTypeRef,
    pub members: Vec<DataTypeRef>,
}

/// Structure group: a tagged union of structures dispatched by a
/// discriminant member of the base structure.
#[derive(Debug, Clone)]
pub struct StructureGroupDefinition {
    pub base: DataTypeRef,
    /// Name of the discriminant member.
    pub identifier: String,
    pub members: Vec<DataTypeRef>,
    /// Fallback variant when no discriminant matches.
    pub default: Option<DataTypeRef>,
}

/// The per-kind payload of a definition.
#[derive(Debug, Clone)]
pub enum DefinitionKind {
    Boolean(BooleanDefinition),
    Character(CharacterDefinition),
    Integer(IntegerDefinition),
    FloatingPoint(FloatingPointDefinition),
    Uuid(UuidDefinition),
    Sequence(ElementSequenceDefinition),
    Stream(ElementSequenceDefinition),
    String(StringDefinition),
    Padding(PaddingDefinition),
    Structure(StructureDefinition),
    Union(UnionDefinition),
    Constant(ConstantDefinition),
    Enumeration(EnumerationDefinition),
    Format(FormatDefinition),
    StructureFamily(StructureFamilyDefinition),
    StructureGroup(StructureGroupDefinition),
}

/// A named data type definition.
#[derive(Debug, Clone)]
pub struct DataTypeDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub urls: Vec<String>,
    pub kind: DefinitionKind,
}

impl DataTypeDefinition {
    /// Create a definition with no aliases, description, or URLs.
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            urls: Vec::new(),
            kind,
        }
    }

    /// The `type` tag of the kind, as spelled in schema documents.
    pub fn type_indicator(&self) -> &'static str {
        match &self.kind {
            DefinitionKind::Boolean(_) => "boolean",
            DefinitionKind::Character(_) => "character",
            DefinitionKind::Integer(_) => "integer",
            DefinitionKind::FloatingPoint(_) => "floating-point",
            DefinitionKind::Uuid(_) => "uuid",
            DefinitionKind::Sequence(_) => "sequence",
            DefinitionKind::Stream(_) => "stream",
            DefinitionKind::String(_) => "string",
            DefinitionKind::Padding(_) => "padding",
            DefinitionKind::Structure(_) => "structure",
            DefinitionKind::Union(_) => "union",
            DefinitionKind::Constant(_) => "constant",
            DefinitionKind::Enumeration(_) => "enumeration",
            DefinitionKind::Format(_) => "format",
            DefinitionKind::StructureFamily(_) => "structure-family",
            DefinitionKind::StructureGroup(_) => "structure-group",
        }
    }

    /// Fixed-size attributes, for the kinds that carry them.
    pub fn fixed_size_attributes(&self) -> Option<&FixedSizeAttributes> {
        match &self.kind {
            DefinitionKind::Boolean(definition) => Some(&definition.attributes),
            DefinitionKind::Character(definition) => Some(&definition.attributes),
            DefinitionKind::Integer(definition) => Some(&definition.attributes),
            DefinitionKind::FloatingPoint(definition) => Some(&definition.attributes),
            DefinitionKind::Uuid(definition) => Some(&definition.attributes),
            _ => None,
        }
    }

    /// Byte size of the definition, `None` when the size cannot be
    /// determined without decoding.
    ///
    /// Requires the resolved registry to chase references.
    pub fn byte_size(&self, registry: &DataTypeRegistry) -> Option<u64> {
        match &self.kind {
            DefinitionKind::Boolean(_)
            | DefinitionKind::Character(_)
            | DefinitionKind::Integer(_)
            | DefinitionKind::FloatingPoint(_)
            | DefinitionKind::Uuid(_) => self.fixed_size_attributes()?.byte_size(),
            DefinitionKind::Sequence(sequence) | DefinitionKind::Stream(sequence) => {
                element_sequence_byte_size(sequence, registry)
            }
            DefinitionKind::String(string) => {
                element_sequence_byte_size(&string.sequence, registry)
            }
            DefinitionKind::Enumeration(_) => Some(4),
            DefinitionKind::Structure(structure) => {
                let mut total = 0u64;
                for member in &structure.members {
                    if member.condition.is_some() {
                        return None;
                    }
                    let size = member_byte_size(member, registry, total)?;
                    total = total.checked_add(size)?;
                }
                Some(total)
            }
            DefinitionKind::Union(union) => {
                let mut largest = 0u64;
                for member in &union.members {
                    if member.condition.is_some() {
                        return None;
                    }
                    let size = member_byte_size(member, registry, 0)?;
                    largest = largest.max(size);
                }
                Some(largest)
            }
            DefinitionKind::Padding(_)
            | DefinitionKind::Constant(_)
            | DefinitionKind::Format(_)
            | DefinitionKind::StructureFamily(_)
            | DefinitionKind::StructureGroup(_) => None,
        }
    }
}

fn element_sequence_byte_size(
    sequence: &ElementSequenceDefinition,
    registry: &DataTypeRegistry,
) -> Option<u64> {
    if sequence.elements_terminator.is_some() {
        return None;
    }
    if let Some(ElementCount::Fixed(size)) = sequence.elements_data_size {
        return Some(size);
    }
    if let Some(ElementCount::Fixed(count)) = sequence.number_of_elements {
        let element = registry.get(sequence.element_data_type.id()?);
        return element.byte_size(registry)?.checked_mul(count);
    }
    None
}

fn member_byte_size(
    member: &MemberDefinition,
    registry: &DataTypeRegistry,
    offset: u64,
) -> Option<u64> {
    match &member.data_type {
        MemberDataType::Reference(reference) => {
            registry.get(reference.id()?).byte_size(registry)
        }
        MemberDataType::Inline(definition) => match &definition.kind {
            // Padding size is deterministic when every preceding member is
            // fixed-size.
            DefinitionKind::Padding(padding) => {
                let alignment = padding.alignment_size;
                Some((alignment - (offset % alignment)) % alignment)
            }
            _ => definition.byte_size(registry),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order_resolve() {
        assert_eq!(
            ByteOrder::BigEndian.resolve(Endianness::Little),
            Endianness::Big
        );
        assert_eq!(
            ByteOrder::Native.resolve(Endianness::Little),
            Endianness::Little
        );
    }

    #[test]
    fn test_fixed_size_attributes() {
        let attributes = FixedSizeAttributes {
            byte_order: ByteOrder::LittleEndian,
            size: DataSize::Bytes(4),
            units: "bytes".to_string(),
        };
        assert_eq!(attributes.byte_size(), Some(4));

        let attributes = FixedSizeAttributes::default();
        assert_eq!(attributes.byte_size(), None);
    }

    #[test]
    fn test_string_encoding_from_name() {
        assert_eq!(
            StringEncoding::from_name("utf-16-le"),
            Some(StringEncoding::Utf16Le)
        );
        assert_eq!(StringEncoding::from_name("ASCII"), Some(StringEncoding::Ascii));
        assert_eq!(StringEncoding::from_name("cp1252"), None);
    }

    #[test]
    fn test_enumeration_lookups() {
        let enumeration = EnumerationDefinition {
            values: vec![
                EnumerationValue {
                    name: "FILE_TYPE_FIFO".to_string(),
                    number: 1,
                    aliases: vec!["FIFO".to_string()],
                    description: None,
                },
                EnumerationValue {
                    name: "FILE_TYPE_DIRECTORY".to_string(),
                    number: 4,
                    aliases: Vec::new(),
                    description: None,
                },
            ],
            byte_order: ByteOrder::Native,
        };

        assert_eq!(enumeration.name_for_number(4), Some("FILE_TYPE_DIRECTORY"));
        assert_eq!(enumeration.name_for_number(2), None);
        assert_eq!(enumeration.number_for_name("FIFO"), Some(1));
    }

    #[test]
    fn test_pinned_value_display() {
        assert_eq!(PinnedValue::Integer(45).to_string(), "45");
        assert_eq!(PinnedValue::Bytes(vec![0x2d, 0x00]).to_string(), "2d00");
    }
}
