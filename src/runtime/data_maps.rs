// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data type maps.
//!
//! The data-driven decode engine: a [`DataTypeMap`] is built from a
//! resolved definition and maps byte streams onto values. Maps are
//! immutable after construction and safe to share across threads as long
//! as every decode receives its own [`MapContext`].
//!
//! [`DataTypeMapFactory`] materializes maps recursively and caches them
//! by definition identity, so one definition yields one map instance per
//! registry.

use crate::definitions::{
    DataTypeDefinition, DataTypeRegistry, DefinitionId, DefinitionKind, ElementCount,
    ElementSequenceDefinition, Endianness, EnumerationValue, IntegerFormat, MemberDataType,
    MemberDefinition, PinnedValue, StringEncoding, StructureGroupDefinition,
};
use crate::error::{DefinitionError, MappingError};
use crate::expression::{Expression, ExpressionError};
use crate::runtime::context::MapContext;
use crate::runtime::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A runtime map decoding byte streams per one data type definition.
#[derive(Debug)]
pub enum DataTypeMap {
    Boolean(BooleanMap),
    Character(CharacterMap),
    Integer(IntegerMap),
    FloatingPoint(FloatingPointMap),
    Uuid(UuidMap),
    Sequence(SequenceMap),
    Stream(StreamMap),
    String(StringMap),
    Padding(PaddingMap),
    Structure(StructureMap),
    Union(UnionMap),
    Constant(ConstantMap),
    Enumeration(EnumerationMap),
    Format(FormatMap),
    StructureFamily(StructureFamilyMap),
    StructureGroup(StructureGroupMap),
}

impl DataTypeMap {
    /// Name of the mapped definition.
    pub fn name(&self) -> &str {
        match self {
            Self::Boolean(map) => &map.name,
            Self::Character(map) => &map.name,
            Self::Integer(map) => &map.name,
            Self::FloatingPoint(map) => &map.name,
            Self::Uuid(map) => &map.name,
            Self::Sequence(map) => &map.inner.name,
            Self::Stream(map) => &map.inner.name,
            Self::String(map) => &map.inner.name,
            Self::Padding(map) => &map.name,
            Self::Structure(map) => &map.name,
            Self::Union(map) => &map.name,
            Self::Constant(map) => &map.name,
            Self::Enumeration(map) => &map.name,
            Self::Format(map) => &map.name,
            Self::StructureFamily(map) => &map.name,
            Self::StructureGroup(map) => &map.name,
        }
    }

    /// Fixed encoded size of the definition in bytes.
    ///
    /// `None` when the size depends on the byte stream: variable-length
    /// sequences, conditional members, family or group dispatch.
    pub fn byte_size(&self) -> Option<u64> {
        match self {
            Self::Boolean(map) => Some(map.size as u64),
            Self::Character(map) => Some(map.size as u64),
            Self::Integer(map) => Some(map.size as u64),
            Self::FloatingPoint(map) => Some(map.size as u64),
            Self::Uuid(_) => Some(16),
            Self::Sequence(map) => map.inner.byte_size,
            Self::Stream(map) => map.inner.byte_size,
            Self::String(map) => map.inner.byte_size,
            Self::Enumeration(_) => Some(4),
            Self::Structure(map) => map.byte_size,
            Self::Union(map) => map.byte_size,
            Self::Padding(_)
            | Self::Constant(_)
            | Self::Format(_)
            | Self::StructureFamily(_)
            | Self::StructureGroup(_) => None,
        }
    }

    /// Map the data type at the start of a byte stream with a fresh
    /// context.
    ///
    /// Returns the decoded value and the number of bytes consumed.
    pub fn map_byte_stream(&self, bytes: &[u8]) -> Result<(Value, usize), MappingError> {
        let mut context = MapContext::new();
        self.map_byte_stream_with(bytes, 0, &mut context)
    }

    /// Map the data type on a byte stream at an offset, accumulating
    /// decoded values into the supplied context.
    pub fn map_byte_stream_with(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        match self {
            Self::Boolean(map) => map.map(bytes, offset),
            Self::Character(map) => map.map(bytes, offset),
            Self::Integer(map) => map.map(bytes, offset),
            Self::FloatingPoint(map) => map.map(bytes, offset),
            Self::Uuid(map) => map.map(bytes, offset),
            Self::Sequence(map) => map.map(bytes, offset, context),
            Self::Stream(map) => map.map(bytes, offset, context),
            Self::String(map) => map.map(bytes, offset, context),
            // A padding map decoded on its own starts at its own
            // boundary, so the structure-relative offset is zero.
            Self::Padding(map) => map.map(bytes, offset, 0),
            Self::Structure(map) => map.map(bytes, offset, context),
            Self::Union(map) => map.map(bytes, offset, context),
            Self::Constant(map) => Err(MappingError::UnmappableKind {
                name: map.name.clone(),
                kind: "constant",
            }),
            Self::Enumeration(map) => map.map(bytes, offset),
            Self::Format(map) => map.map(bytes, offset, context),
            Self::StructureFamily(map) => Err(MappingError::FamilyVariantNotSelected {
                family: map.name.clone(),
            }),
            Self::StructureGroup(map) => map.map(bytes, offset, context),
        }
    }

    /// Select a structure-family variant by name.
    pub fn select_variant(&self, variant: &str) -> Result<Arc<DataTypeMap>, MappingError> {
        match self {
            Self::StructureFamily(map) => map.variant(variant),
            _ => Err(MappingError::UnknownFamilyVariant {
                family: self.name().to_string(),
                variant: variant.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed-size maps
// ---------------------------------------------------------------------------

/// Boolean data type map.
#[derive(Debug)]
pub struct BooleanMap {
    pub(crate) name: String,
    pub(crate) size: usize,
    pub(crate) endianness: Endianness,
    pub(crate) false_value: u64,
    pub(crate) true_value: Option<u64>,
}

impl BooleanMap {
    fn map(&self, bytes: &[u8], offset: usize) -> Result<(Value, usize), MappingError> {
        let slice = read_bytes(&self.name, bytes, offset, self.size)?;
        let value = read_unsigned(slice, self.endianness);

        if value == self.false_value {
            return Ok((Value::Boolean(false), self.size));
        }
        match self.true_value {
            None => Ok((Value::Boolean(true), self.size)),
            Some(true_value) if value == true_value => Ok((Value::Boolean(true), self.size)),
            Some(_) => Err(MappingError::InvalidBooleanEncoding {
                name: self.name.clone(),
                offset,
                value,
            }),
        }
    }
}

/// Character data type map.
#[derive(Debug)]
pub struct CharacterMap {
    pub(crate) name: String,
    pub(crate) size: usize,
    pub(crate) endianness: Endianness,
}

impl CharacterMap {
    fn map(&self, bytes: &[u8], offset: usize) -> Result<(Value, usize), MappingError> {
        let slice = read_bytes(&self.name, bytes, offset, self.size)?;
        let code_point = read_unsigned(slice, self.endianness);

        let code_point = u32::try_from(code_point).ok().and_then(char::from_u32);
        match code_point {
            Some(character) => Ok((Value::Character(character), self.size)),
            None => Err(MappingError::InvalidEncoding {
                name: self.name.clone(),
                offset,
                message: "invalid code point".to_string(),
            }),
        }
    }
}

/// Integer data type map.
#[derive(Debug)]
pub struct IntegerMap {
    pub(crate) name: String,
    pub(crate) size: usize,
    pub(crate) endianness: Endianness,
    pub(crate) format: IntegerFormat,
}

impl IntegerMap {
    fn map(&self, bytes: &[u8], offset: usize) -> Result<(Value, usize), MappingError> {
        let slice = read_bytes(&self.name, bytes, offset, self.size)?;
        let value = match self.format {
            IntegerFormat::Signed => Value::Integer(read_signed(slice, self.endianness)),
            IntegerFormat::Unsigned => {
                Value::UnsignedInteger(read_unsigned(slice, self.endianness))
            }
        };
        Ok((value, self.size))
    }
}

/// Floating-point data type map.
#[derive(Debug)]
pub struct FloatingPointMap {
    pub(crate) name: String,
    pub(crate) size: usize,
    pub(crate) endianness: Endianness,
}

impl FloatingPointMap {
    fn map(&self, bytes: &[u8], offset: usize) -> Result<(Value, usize), MappingError> {
        let slice = read_bytes(&self.name, bytes, offset, self.size)?;
        let value = match (self.size, self.endianness) {
            (4, Endianness::Little) => {
                f64::from(f32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
            }
            (4, Endianness::Big) => {
                f64::from(f32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
            }
            (8, Endianness::Little) => f64::from_le_bytes([
                slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
            ]),
            (8, Endianness::Big) => f64::from_be_bytes([
                slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
            ]),
            _ => {
                return Err(MappingError::InvalidEncoding {
                    name: self.name.clone(),
                    offset,
                    message: format!("unsupported floating-point size: {}", self.size),
                })
            }
        };
        Ok((Value::Float(value), self.size))
    }
}

/// UUID (or GUID) data type map.
///
/// The byte order governs the layout of the first three fields only, per
/// the standard GUID convention.
#[derive(Debug)]
pub struct UuidMap {
    pub(crate) name: String,
    pub(crate) endianness: Endianness,
}

impl UuidMap {
    fn map(&self, bytes: &[u8], offset: usize) -> Result<(Value, usize), MappingError> {
        let slice = read_bytes(&self.name, bytes, offset, 16)?;
        let mut storage = [0u8; 16];
        storage.copy_from_slice(slice);

        let value = match self.endianness {
            Endianness::Big => Uuid::from_bytes(storage),
            Endianness::Little => Uuid::from_bytes_le(storage),
        };
        Ok((Value::Uuid(value), 16))
    }
}

// ---------------------------------------------------------------------------
// Element sequence maps
// ---------------------------------------------------------------------------

/// Shared state of sequence, stream, and string maps.
#[derive(Debug)]
pub(crate) struct ElementSequenceMap {
    pub(crate) name: String,
    pub(crate) element: Arc<DataTypeMap>,
    /// Fixed element size; required for streams and strings.
    pub(crate) element_size: Option<usize>,
    pub(crate) number_of_elements: Option<ElementCount>,
    pub(crate) elements_data_size: Option<ElementCount>,
    /// Terminator rendered to the element size.
    pub(crate) terminator: Option<Vec<u8>>,
    pub(crate) byte_size: Option<u64>,
}

/// End bound of an element run, from the count or size attribute.
enum ElementBound {
    Count(u64),
    DataSize(u64),
    TerminatorOnly,
}

impl ElementSequenceMap {
    fn evaluate_bound(&self, context: &MapContext) -> Result<ElementBound, MappingError> {
        if let Some(count) = &self.number_of_elements {
            return Ok(ElementBound::Count(self.evaluate_count(count, context)?));
        }
        if let Some(size) = &self.elements_data_size {
            return Ok(ElementBound::DataSize(self.evaluate_count(size, context)?));
        }
        Ok(ElementBound::TerminatorOnly)
    }

    fn evaluate_count(
        &self,
        count: &ElementCount,
        context: &MapContext,
    ) -> Result<u64, MappingError> {
        match count {
            ElementCount::Fixed(value) => Ok(*value),
            ElementCount::Expression(expression) => {
                let value = expression
                    .evaluate_integer(context)
                    .map_err(|error| expression_error(&self.name, error))?;
                u64::try_from(value).map_err(|_| MappingError::InvalidElementCount {
                    name: self.name.clone(),
                    value,
                })
            }
        }
    }

    /// Whether the terminator pattern sits at `offset`.
    fn terminator_at(&self, bytes: &[u8], offset: usize) -> bool {
        match &self.terminator {
            Some(pattern) => bytes
                .get(offset..)
                .is_some_and(|remaining| remaining.starts_with(pattern)),
            None => false,
        }
    }
}

/// Sequence data type map: decoded elements.
#[derive(Debug)]
pub struct SequenceMap {
    pub(crate) inner: ElementSequenceMap,
}

impl SequenceMap {
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        let inner = &self.inner;
        let bound = inner.evaluate_bound(context)?;
        let mut values = Vec::new();
        let mut cursor = offset;

        loop {
            match bound {
                ElementBound::Count(count) => {
                    if values.len() as u64 == count {
                        break;
                    }
                }
                ElementBound::DataSize(size) => {
                    let data = (cursor - offset) as u64;
                    if data == size {
                        break;
                    }
                    if data > size {
                        return Err(MappingError::TrailingBytes {
                            name: inner.name.clone(),
                            offset: cursor,
                        });
                    }
                }
                ElementBound::TerminatorOnly => {}
            }

            if inner.terminator_at(bytes, cursor) {
                // The terminator counts toward consumed bytes but not the
                // value.
                cursor += inner.terminator.as_ref().map_or(0, Vec::len);
                break;
            }

            let (value, consumed) = inner.element.map_byte_stream_with(bytes, cursor, context)?;
            values.push(value);
            cursor += consumed;
        }

        Ok((Value::Sequence(values), cursor - offset))
    }
}

/// Stream data type map: raw element bytes.
#[derive(Debug)]
pub struct StreamMap {
    pub(crate) inner: ElementSequenceMap,
}

impl StreamMap {
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        let (data_size, consumed) = map_raw_extent(&self.inner, bytes, offset, context)?;
        let value = bytes[offset..offset + data_size].to_vec();
        Ok((Value::Bytes(value), consumed))
    }
}

/// String data type map: stream bytes decoded as text.
#[derive(Debug)]
pub struct StringMap {
    pub(crate) inner: ElementSequenceMap,
    pub(crate) encoding: StringEncoding,
}

impl StringMap {
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        let (data_size, consumed) = map_raw_extent(&self.inner, bytes, offset, context)?;
        let data = &bytes[offset..offset + data_size];
        let text = decode_text(&self.inner.name, offset, data, self.encoding)?;
        Ok((Value::String(text), consumed))
    }
}

/// Walk the element run of a stream or string.
///
/// Returns the element data size (terminator excluded) and the consumed
/// size (terminator included).
fn map_raw_extent(
    inner: &ElementSequenceMap,
    bytes: &[u8],
    offset: usize,
    context: &MapContext,
) -> Result<(usize, usize), MappingError> {
    let element_size = inner.element_size.unwrap_or(1);
    let bound = inner.evaluate_bound(context)?;
    let mut cursor = offset;
    let mut count = 0u64;

    loop {
        match bound {
            ElementBound::Count(bound_count) => {
                if count == bound_count {
                    break;
                }
            }
            ElementBound::DataSize(size) => {
                let data = (cursor - offset) as u64;
                if data == size {
                    break;
                }
                if data > size {
                    return Err(MappingError::TrailingBytes {
                        name: inner.name.clone(),
                        offset: cursor,
                    });
                }
            }
            ElementBound::TerminatorOnly => {}
        }

        if inner.terminator_at(bytes, cursor) {
            let terminator_size = inner.terminator.as_ref().map_or(0, Vec::len);
            return Ok((cursor - offset, cursor + terminator_size - offset));
        }

        read_bytes(&inner.name, bytes, cursor, element_size)?;
        cursor += element_size;
        count += 1;
    }

    Ok((cursor - offset, cursor - offset))
}

fn decode_text(
    name: &str,
    offset: usize,
    data: &[u8],
    encoding: StringEncoding,
) -> Result<String, MappingError> {
    let invalid = |message: &str| MappingError::InvalidEncoding {
        name: name.to_string(),
        offset,
        message: message.to_string(),
    };

    match encoding {
        StringEncoding::Ascii => {
            if data.iter().any(|byte| !byte.is_ascii()) {
                return Err(invalid("invalid ASCII byte"));
            }
            Ok(data.iter().map(|byte| *byte as char).collect())
        }
        StringEncoding::Utf8 => String::from_utf8(data.to_vec())
            .map_err(|_| invalid("invalid UTF-8 byte sequence")),
        StringEncoding::Utf16Le | StringEncoding::Utf16Be => {
            if data.len() % 2 != 0 {
                return Err(invalid("odd number of UTF-16 bytes"));
            }
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| match encoding {
                    StringEncoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
                    _ => u16::from_le_bytes([pair[0], pair[1]]),
                })
                .collect();
            String::from_utf16(&units).map_err(|_| invalid("invalid UTF-16 code unit sequence"))
        }
    }
}

// ---------------------------------------------------------------------------
// Padding
// ---------------------------------------------------------------------------

/// Padding data type map.
#[derive(Debug)]
pub struct PaddingMap {
    pub(crate) name: String,
    pub(crate) alignment_size: usize,
}

impl PaddingMap {
    /// Bytes needed to advance `relative_offset` to the next alignment
    /// boundary.
    pub(crate) fn padding_size(&self, relative_offset: usize) -> usize {
        (self.alignment_size - (relative_offset % self.alignment_size)) % self.alignment_size
    }

    /// Map padding at `offset`, aligning `relative_offset` (the offset
    /// from the containing structure's start).
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        relative_offset: usize,
    ) -> Result<(Value, usize), MappingError> {
        let padding = self.padding_size(relative_offset);
        let slice = read_bytes(&self.name, bytes, offset, padding)?;
        Ok((Value::Bytes(slice.to_vec()), padding))
    }
}

// ---------------------------------------------------------------------------
// Composite maps
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct StructureMemberMap {
    pub(crate) name: String,
    pub(crate) condition: Option<Expression>,
    pub(crate) map: Arc<DataTypeMap>,
    pub(crate) pinned_values: Vec<PinnedValue>,
}

/// Structure data type map: members decoded in declaration order.
#[derive(Debug)]
pub struct StructureMap {
    pub(crate) name: String,
    pub(crate) members: Vec<StructureMemberMap>,
    pub(crate) byte_size: Option<u64>,
}

impl StructureMap {
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        context.push_scope(&self.name);
        let result = self.map_members(bytes, offset, context);
        context.pop_scope();
        result
    }

    fn map_members(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        let mut entries = Vec::with_capacity(self.members.len());
        let mut cursor = offset;

        for member in &self.members {
            if let Some(condition) = &member.condition {
                let present = condition
                    .evaluate_condition(context)
                    .map_err(|error| expression_error(&self.name, error))?;
                if !present {
                    continue;
                }
            }

            let (value, consumed) = match member.map.as_ref() {
                DataTypeMap::Padding(padding) => padding.map(bytes, cursor, cursor - offset)?,
                _ => member.map.map_byte_stream_with(bytes, cursor, context)?,
            };

            if !member.pinned_values.is_empty()
                && !member
                    .pinned_values
                    .iter()
                    .any(|pin| pin_matches(pin, &value))
            {
                return Err(MappingError::ConstantMismatch {
                    name: self.name.clone(),
                    member: member.name.clone(),
                    offset: cursor,
                });
            }

            context.set(member.name.clone(), value.clone());
            entries.push((member.name.clone(), value));
            cursor += consumed;
        }

        Ok((Value::Structure(entries), cursor - offset))
    }
}

/// Union data type map: every member decoded at the same offset.
#[derive(Debug)]
pub struct UnionMap {
    pub(crate) name: String,
    pub(crate) members: Vec<StructureMemberMap>,
    pub(crate) byte_size: Option<u64>,
}

impl UnionMap {
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        context.push_scope(&self.name);
        let result = self.map_members(bytes, offset, context);
        context.pop_scope();
        result
    }

    fn map_members(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        let mut values = Vec::with_capacity(self.members.len());
        let mut largest = 0;

        for member in &self.members {
            let (value, consumed) = match member.map.as_ref() {
                // Union members share the union's start, so a padding
                // member is always at relative offset zero.
                DataTypeMap::Padding(padding) => padding.map(bytes, offset, 0)?,
                _ => member.map.map_byte_stream_with(bytes, offset, context)?,
            };
            context.set(member.name.clone(), value.clone());
            values.push(value);
            largest = largest.max(consumed);
        }

        Ok((Value::Union(values), largest))
    }
}

/// Constant data type map; constants have no byte-stream representation.
#[derive(Debug)]
pub struct ConstantMap {
    pub(crate) name: String,
}

/// Enumeration data type map.
///
/// Decodes the underlying 32-bit unsigned integer and attaches the
/// symbolic name when the number matches a declared value.
#[derive(Debug)]
pub struct EnumerationMap {
    pub(crate) name: String,
    pub(crate) endianness: Endianness,
    pub(crate) values: Vec<EnumerationValue>,
}

impl EnumerationMap {
    fn map(&self, bytes: &[u8], offset: usize) -> Result<(Value, usize), MappingError> {
        let slice = read_bytes(&self.name, bytes, offset, 4)?;
        let number = read_unsigned(slice, self.endianness) as i64;
        let name = self
            .values
            .iter()
            .find(|value| value.number == number)
            .map(|value| value.name.clone());
        Ok((Value::Enum(number, name), 4))
    }
}

#[derive(Debug)]
pub(crate) struct FormatLayoutEntry {
    pub(crate) name: String,
    pub(crate) offset: usize,
    pub(crate) map: Arc<DataTypeMap>,
}

/// Format data type map: layout entries at absolute offsets.
#[derive(Debug)]
pub struct FormatMap {
    pub(crate) name: String,
    pub(crate) layout: Vec<FormatLayoutEntry>,
}

impl FormatMap {
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        let mut entries = Vec::with_capacity(self.layout.len());
        let mut consumed = 0;

        for entry in &self.layout {
            let entry_offset = offset + entry.offset;
            let (value, entry_consumed) = match entry.map.as_ref() {
                // A padding entry aligns relative to the format start,
                // which is the entry's declared layout offset.
                DataTypeMap::Padding(padding) => {
                    padding.map(bytes, entry_offset, entry.offset)?
                }
                _ => entry.map.map_byte_stream_with(bytes, entry_offset, context)?,
            };
            context.set(entry.name.clone(), value.clone());
            entries.push((entry.name.clone(), value));
            consumed = consumed.max(entry.offset + entry_consumed);
        }

        Ok((Value::Format(entries), consumed))
    }
}

/// Structure family map: variant structures sharing a base.
///
/// Decoding is caller-driven; select a variant with
/// [`DataTypeMap::select_variant`] and map through the returned
/// structure map.
#[derive(Debug)]
pub struct StructureFamilyMap {
    pub(crate) name: String,
    pub(crate) base: Arc<DataTypeMap>,
    pub(crate) variants: Vec<(String, Arc<DataTypeMap>)>,
}

impl StructureFamilyMap {
    /// The family's base structure map.
    pub fn base(&self) -> &Arc<DataTypeMap> {
        &self.base
    }

    /// Names of the family variants.
    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(name, _)| name.as_str())
    }

    fn variant(&self, name: &str) -> Result<Arc<DataTypeMap>, MappingError> {
        self.variants
            .iter()
            .find(|(variant_name, _)| variant_name == name)
            .map(|(_, map)| map.clone())
            .ok_or_else(|| MappingError::UnknownFamilyVariant {
                family: self.name.clone(),
                variant: name.to_string(),
            })
    }
}

#[derive(Debug)]
pub(crate) struct GroupVariant {
    pub(crate) name: String,
    pub(crate) pinned_values: Vec<PinnedValue>,
    pub(crate) map: Arc<DataTypeMap>,
}

/// Structure group map: a tagged union dispatched on a discriminant
/// member of the base structure.
#[derive(Debug)]
pub struct StructureGroupMap {
    pub(crate) name: String,
    pub(crate) identifier: String,
    pub(crate) base: Arc<DataTypeMap>,
    pub(crate) variants: Vec<GroupVariant>,
    pub(crate) default: Option<Arc<DataTypeMap>>,
}

impl StructureGroupMap {
    fn map(
        &self,
        bytes: &[u8],
        offset: usize,
        context: &mut MapContext,
    ) -> Result<(Value, usize), MappingError> {
        // Peek the base structure to observe the discriminant; the peek
        // context is discarded so only the chosen variant contributes.
        let mut peek_context = MapContext::new();
        let (base_value, _) = self
            .base
            .map_byte_stream_with(bytes, offset, &mut peek_context)?;

        let identifier_value =
            base_value
                .field(&self.identifier)
                .ok_or_else(|| MappingError::UnknownGroupVariant {
                    name: self.name.clone(),
                    identifier: self.identifier.clone(),
                    value: "<not decoded>".to_string(),
                })?;

        let variant = self
            .variants
            .iter()
            .find(|variant| {
                variant
                    .pinned_values
                    .iter()
                    .any(|pin| pin_matches(pin, identifier_value))
            })
            .map(|variant| {
                log::debug!(
                    "group {} dispatching to variant: {}",
                    self.name,
                    variant.name
                );
                &variant.map
            })
            .or(self.default.as_ref())
            .ok_or_else(|| MappingError::UnknownGroupVariant {
                name: self.name.clone(),
                identifier: self.identifier.clone(),
                value: display_value(identifier_value),
            })?;

        variant.map_byte_stream_with(bytes, offset, context)
    }
}

// ---------------------------------------------------------------------------
// Shared decode helpers
// ---------------------------------------------------------------------------

pub(crate) fn read_bytes<'a>(
    name: &str,
    bytes: &'a [u8],
    offset: usize,
    count: usize,
) -> Result<&'a [u8], MappingError> {
    let end = offset.checked_add(count);
    match end {
        Some(end) if end <= bytes.len() => Ok(&bytes[offset..end]),
        _ => Err(MappingError::ByteStreamTooSmall {
            name: name.to_string(),
            offset,
            needed: count,
            available: bytes.len().saturating_sub(offset),
        }),
    }
}

pub(crate) fn read_unsigned(slice: &[u8], endianness: Endianness) -> u64 {
    let mut value = 0u64;
    match endianness {
        Endianness::Big => {
            for byte in slice {
                value = (value << 8) | u64::from(*byte);
            }
        }
        Endianness::Little => {
            for byte in slice.iter().rev() {
                value = (value << 8) | u64::from(*byte);
            }
        }
    }
    value
}

fn read_signed(slice: &[u8], endianness: Endianness) -> i64 {
    let unsigned = read_unsigned(slice, endianness);
    let bits = slice.len() as u32 * 8;
    if bits >= 64 {
        return unsigned as i64;
    }
    // Two's complement sign extension.
    let sign_bit = 1u64 << (bits - 1);
    if unsigned & sign_bit != 0 {
        (unsigned | !((1u64 << bits) - 1)) as i64
    } else {
        unsigned as i64
    }
}

fn expression_error(name: &str, error: ExpressionError) -> MappingError {
    match error {
        ExpressionError::UnboundPath(path) => MappingError::UnboundExpressionPath {
            name: name.to_string(),
            path,
        },
        other => MappingError::ExpressionEvaluation {
            name: name.to_string(),
            source: other,
        },
    }
}

/// Whether a decoded value matches a pinned byte pattern.
pub(crate) fn pin_matches(pin: &PinnedValue, value: &Value) -> bool {
    match (pin, value) {
        (PinnedValue::Integer(pin), Value::Integer(value)) => pin == value,
        (PinnedValue::Integer(pin), Value::UnsignedInteger(value)) => {
            u64::try_from(*pin).is_ok_and(|pin| pin == *value)
        }
        (PinnedValue::Integer(pin), Value::Enum(number, _)) => pin == number,
        (PinnedValue::Integer(pin), Value::Boolean(value)) => *pin == i64::from(*value),
        (PinnedValue::String(pin), Value::String(value)) => pin == value,
        // Escaped byte strings parse to U+00..U+FF code points; compare
        // code point to byte.
        (PinnedValue::String(pin), Value::Bytes(value)) => {
            pin.chars().count() == value.len()
                && pin
                    .chars()
                    .zip(value.iter())
                    .all(|(character, byte)| u32::from(character) == u32::from(*byte))
        }
        (PinnedValue::Bytes(pin), Value::Bytes(value)) => pin == value,
        (PinnedValue::Bytes(pin), Value::String(value)) => &pin[..] == value.as_bytes(),
        _ => false,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Integer(number) => format!("0x{:x}", number),
        Value::UnsignedInteger(number) => format!("0x{:x}", number),
        Value::Enum(number, _) => format!("0x{:x}", number),
        other => format!("{:?}", other),
    }
}

/// Render a terminator attribute to an element-sized byte pattern.
fn render_terminator(
    name: &str,
    terminator: &[u8],
    element_size: Option<usize>,
) -> Result<Vec<u8>, DefinitionError> {
    match element_size {
        Some(size) if terminator.len() > size => Err(DefinitionError::Schema {
            name: name.to_string(),
            message: "elements terminator larger than element data type".to_string(),
        }),
        Some(size) => {
            let mut pattern = terminator.to_vec();
            pattern.resize(size, 0);
            Ok(pattern)
        }
        None => Ok(terminator.to_vec()),
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Factory building data type maps from a resolved registry.
///
/// Maps are cached by definition identity: repeated requests for the same
/// definition return the same `Arc` instance.
#[derive(Debug)]
pub struct DataTypeMapFactory {
    registry: DataTypeRegistry,
    cache: HashMap<DefinitionId, Arc<DataTypeMap>>,
    native: Endianness,
}

impl DataTypeMapFactory {
    /// Create a factory over a resolved registry.
    ///
    /// The host byte order is resolved here, once, and recorded on every
    /// map the factory builds.
    #[must_use]
    pub fn new(registry: DataTypeRegistry) -> Self {
        Self {
            registry,
            cache: HashMap::new(),
            native: Endianness::native(),
        }
    }

    /// The wrapped registry.
    #[must_use]
    pub fn registry(&self) -> &DataTypeRegistry {
        &self.registry
    }

    /// Create (or fetch from cache) the map for a named definition.
    pub fn create(&mut self, name: &str) -> Result<Arc<DataTypeMap>, DefinitionError> {
        if !self.registry.is_resolved() {
            return Err(DefinitionError::Schema {
                name: name.to_string(),
                message: "registry has not been resolved".to_string(),
            });
        }
        let id = self
            .registry
            .lookup_id(name)
            .ok_or_else(|| DefinitionError::UnresolvedReference {
                name: name.to_string(),
                referenced_by: "data type map factory".to_string(),
            })?;
        self.build(id)
    }

    fn build(&mut self, id: DefinitionId) -> Result<Arc<DataTypeMap>, DefinitionError> {
        if let Some(map) = self.cache.get(&id) {
            return Ok(map.clone());
        }

        let definition = self.registry.get(id).clone();
        let map = Arc::new(self.build_definition(&definition)?);
        self.cache.insert(id, map.clone());
        Ok(map)
    }

    fn build_reference(
        &mut self,
        reference_id: Option<DefinitionId>,
        owner: &str,
    ) -> Result<Arc<DataTypeMap>, DefinitionError> {
        let id = reference_id.ok_or_else(|| DefinitionError::Schema {
            name: owner.to_string(),
            message: "unresolved data type reference".to_string(),
        })?;
        self.build(id)
    }

    fn build_definition(
        &mut self,
        definition: &DataTypeDefinition,
    ) -> Result<DataTypeMap, DefinitionError> {
        let name = definition.name.clone();
        let fixed_size = |definition: &DataTypeDefinition| -> Result<usize, DefinitionError> {
            definition
                .fixed_size_attributes()
                .and_then(|attributes| attributes.byte_size())
                .map(|size| size as usize)
                .ok_or_else(|| DefinitionError::Schema {
                    name: definition.name.clone(),
                    message: "missing size attribute".to_string(),
                })
        };

        match &definition.kind {
            DefinitionKind::Boolean(boolean) => Ok(DataTypeMap::Boolean(BooleanMap {
                size: fixed_size(definition)?,
                endianness: boolean.attributes.byte_order.resolve(self.native),
                false_value: boolean.false_value,
                true_value: boolean.true_value,
                name,
            })),
            DefinitionKind::Character(character) => Ok(DataTypeMap::Character(CharacterMap {
                size: fixed_size(definition)?,
                endianness: character.attributes.byte_order.resolve(self.native),
                name,
            })),
            DefinitionKind::Integer(integer) => Ok(DataTypeMap::Integer(IntegerMap {
                size: fixed_size(definition)?,
                endianness: integer.attributes.byte_order.resolve(self.native),
                format: integer.format,
                name,
            })),
            DefinitionKind::FloatingPoint(floating_point) => {
                Ok(DataTypeMap::FloatingPoint(FloatingPointMap {
                    size: fixed_size(definition)?,
                    endianness: floating_point.attributes.byte_order.resolve(self.native),
                    name,
                }))
            }
            DefinitionKind::Uuid(uuid) => Ok(DataTypeMap::Uuid(UuidMap {
                endianness: uuid.attributes.byte_order.resolve(self.native),
                name,
            })),
            DefinitionKind::Sequence(sequence) => {
                let inner = self.build_element_sequence(definition, sequence, false)?;
                Ok(DataTypeMap::Sequence(SequenceMap { inner }))
            }
            DefinitionKind::Stream(stream) => {
                let inner = self.build_element_sequence(definition, stream, true)?;
                Ok(DataTypeMap::Stream(StreamMap { inner }))
            }
            DefinitionKind::String(string) => {
                let inner = self.build_element_sequence(definition, &string.sequence, true)?;
                Ok(DataTypeMap::String(StringMap {
                    inner,
                    encoding: string.encoding,
                }))
            }
            DefinitionKind::Padding(padding) => Ok(DataTypeMap::Padding(PaddingMap {
                alignment_size: padding.alignment_size as usize,
                name,
            })),
            DefinitionKind::Structure(structure) => {
                let members = self.build_members(&name, &structure.members)?;
                Ok(DataTypeMap::Structure(StructureMap {
                    byte_size: definition.byte_size(&self.registry),
                    members,
                    name,
                }))
            }
            DefinitionKind::Union(union) => {
                let members = self.build_members(&name, &union.members)?;
                Ok(DataTypeMap::Union(UnionMap {
                    byte_size: definition.byte_size(&self.registry),
                    members,
                    name,
                }))
            }
            DefinitionKind::Constant(_) => Ok(DataTypeMap::Constant(ConstantMap { name })),
            DefinitionKind::Enumeration(enumeration) => {
                Ok(DataTypeMap::Enumeration(EnumerationMap {
                    endianness: enumeration.byte_order.resolve(self.native),
                    values: enumeration.values.clone(),
                    name,
                }))
            }
            DefinitionKind::Format(format) => {
                let mut layout = Vec::with_capacity(format.layout.len());
                for element in &format.layout {
                    let map = self.build_reference(element.data_type.id(), &name)?;
                    layout.push(FormatLayoutEntry {
                        name: map.name().to_string(),
                        offset: element.offset as usize,
                        map,
                    });
                }
                Ok(DataTypeMap::Format(FormatMap { name, layout }))
            }
            DefinitionKind::StructureFamily(family) => {
                let base = self.build_reference(family.base.id(), &name)?;
                let mut variants = Vec::with_capacity(family.members.len());
                for member in &family.members {
                    let map = self.build_reference(member.id(), &name)?;
                    variants.push((map.name().to_string(), map));
                }
                Ok(DataTypeMap::StructureFamily(StructureFamilyMap {
                    name,
                    base,
                    variants,
                }))
            }
            DefinitionKind::StructureGroup(group) => {
                let base = self.build_reference(group.base.id(), &name)?;
                let mut variants = Vec::with_capacity(group.members.len());
                for member in &group.members {
                    let pinned_values = self.group_member_pins(&name, group, member.id())?;
                    let map = self.build_reference(member.id(), &name)?;
                    variants.push(GroupVariant {
                        name: map.name().to_string(),
                        pinned_values,
                        map,
                    });
                }
                let default = match &group.default {
                    Some(default) => Some(self.build_reference(default.id(), &name)?),
                    None => None,
                };
                Ok(DataTypeMap::StructureGroup(StructureGroupMap {
                    name,
                    identifier: group.identifier.clone(),
                    base,
                    variants,
                    default,
                }))
            }
        }
    }

    fn build_element_sequence(
        &mut self,
        definition: &DataTypeDefinition,
        sequence: &ElementSequenceDefinition,
        require_fixed_element: bool,
    ) -> Result<ElementSequenceMap, DefinitionError> {
        let name = definition.name.clone();
        let element = self.build_reference(sequence.element_data_type.id(), &name)?;
        let element_size = element.byte_size().map(|size| size as usize);

        if require_fixed_element && element_size.is_none() {
            return Err(DefinitionError::Schema {
                name,
                message: "element data type must be fixed-size".to_string(),
            });
        }

        let terminator = match &sequence.elements_terminator {
            Some(terminator) => Some(render_terminator(&name, terminator, element_size)?),
            None => None,
        };

        Ok(ElementSequenceMap {
            byte_size: definition.byte_size(&self.registry),
            element,
            element_size,
            number_of_elements: sequence.number_of_elements.clone(),
            elements_data_size: sequence.elements_data_size.clone(),
            terminator,
            name,
        })
    }

    fn build_members(
        &mut self,
        owner: &str,
        members: &[MemberDefinition],
    ) -> Result<Vec<StructureMemberMap>, DefinitionError> {
        let mut maps = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            let map = match &member.data_type {
                MemberDataType::Reference(reference) => {
                    self.build_reference(reference.id(), owner)?
                }
                MemberDataType::Inline(inline) => Arc::new(self.build_definition(inline)?),
            };
            let name = member
                .name
                .clone()
                .unwrap_or_else(|| format!("member{}", index));
            maps.push(StructureMemberMap {
                name,
                condition: member.condition.clone(),
                map,
                pinned_values: member.pinned_values.clone(),
            });
        }
        Ok(maps)
    }

    fn group_member_pins(
        &self,
        group_name: &str,
        group: &StructureGroupDefinition,
        member_id: Option<DefinitionId>,
    ) -> Result<Vec<PinnedValue>, DefinitionError> {
        let invalid = |member: &str, message: &str| DefinitionError::GroupMemberInvalid {
            group: group_name.to_string(),
            member: member.to_string(),
            message: message.to_string(),
        };

        let id = member_id.ok_or_else(|| invalid("<unresolved>", "unresolved member"))?;
        let member_definition = self.registry.get(id);
        match &member_definition.kind {
            DefinitionKind::Structure(structure) => structure
                .member(&group.identifier)
                .filter(|member| !member.pinned_values.is_empty())
                .map(|member| member.pinned_values.clone())
                .ok_or_else(|| {
                    invalid(
                        &member_definition.name,
                        "missing pinned identifier member",
                    )
                }),
            _ => Err(invalid(&member_definition.name, "member is not a structure")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_unsigned() {
        assert_eq!(read_unsigned(&[0x01, 0x00], Endianness::Little), 1);
        assert_eq!(read_unsigned(&[0x01, 0x00], Endianness::Big), 256);
        assert_eq!(
            read_unsigned(&[0xff, 0xff, 0xff, 0xff], Endianness::Little),
            0xffff_ffff
        );
    }

    #[test]
    fn test_read_signed_sign_extension() {
        assert_eq!(read_signed(&[0xfe, 0xff, 0xff, 0xff], Endianness::Little), -2);
        assert_eq!(read_signed(&[0xff], Endianness::Little), -1);
        assert_eq!(read_signed(&[0x7f], Endianness::Little), 127);
        assert_eq!(
            read_signed(
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
                Endianness::Big
            ),
            -1
        );
    }

    #[test]
    fn test_read_bytes_too_small() {
        let result = read_bytes("int32", &[0x00, 0x01], 0, 4);
        assert!(matches!(
            result,
            Err(MappingError::ByteStreamTooSmall {
                needed: 4,
                available: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_pin_matches() {
        assert!(pin_matches(&PinnedValue::Integer(0x2d), &Value::UnsignedInteger(0x2d)));
        assert!(pin_matches(&PinnedValue::Integer(-1), &Value::Integer(-1)));
        assert!(!pin_matches(&PinnedValue::Integer(-1), &Value::UnsignedInteger(1)));
        assert!(pin_matches(
            &PinnedValue::Bytes(vec![0x53, 0xef]),
            &Value::Bytes(vec![0x53, 0xef])
        ));
        assert!(pin_matches(
            &PinnedValue::String("WINEVT".to_string()),
            &Value::Bytes(b"WINEVT".to_vec())
        ));
    }

    #[test]
    fn test_padding_size() {
        let padding = PaddingMap {
            name: "alignment_padding".to_string(),
            alignment_size: 4,
        };
        assert_eq!(padding.padding_size(0), 0);
        assert_eq!(padding.padding_size(1), 3);
        assert_eq!(padding.padding_size(4), 0);
        assert_eq!(padding.padding_size(6), 2);
    }

    #[test]
    fn test_integer_map_decode() {
        let map = IntegerMap {
            name: "int32le".to_string(),
            size: 4,
            endianness: Endianness::Little,
            format: IntegerFormat::Signed,
        };
        let (value, consumed) = map.map(&[0xfe, 0xff, 0xff, 0xff], 0).unwrap();
        assert_eq!(value, Value::Integer(-2));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_boolean_map_decode() {
        let map = BooleanMap {
            name: "bool8".to_string(),
            size: 1,
            endianness: Endianness::Little,
            false_value: 0,
            true_value: Some(1),
        };
        assert_eq!(map.map(&[0x00], 0).unwrap().0, Value::Boolean(false));
        assert_eq!(map.map(&[0x01], 0).unwrap().0, Value::Boolean(true));
        assert!(matches!(
            map.map(&[0x02], 0),
            Err(MappingError::InvalidBooleanEncoding { value: 2, .. })
        ));
    }

    #[test]
    fn test_uuid_map_endianness() {
        let bytes: [u8; 16] = [
            0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];

        let little = UuidMap {
            name: "guid".to_string(),
            endianness: Endianness::Little,
        };
        let (value, consumed) = little.map(&bytes, 0).unwrap();
        assert_eq!(consumed, 16);
        assert_eq!(
            value.as_uuid().map(|uuid| uuid.to_string()),
            Some("00112233-4455-6677-8899-aabbccddeeff".to_string())
        );

        let big = UuidMap {
            name: "uuid".to_string(),
            endianness: Endianness::Big,
        };
        let (value, _) = big.map(&bytes, 0).unwrap();
        assert_eq!(
            value.as_uuid().map(|uuid| uuid.to_string()),
            Some("33221100-5544-7766-8899-aabbccddeeff".to_string())
        );
    }

    #[test]
    fn test_decode_text_encodings() {
        assert_eq!(
            decode_text("string", 0, b"abc", StringEncoding::Ascii).unwrap(),
            "abc"
        );
        assert!(decode_text("string", 0, &[0xc3, 0x28], StringEncoding::Utf8).is_err());
        assert_eq!(
            decode_text(
                "string",
                0,
                &[0x64, 0x00, 0x74, 0x00],
                StringEncoding::Utf16Le
            )
            .unwrap(),
            "dt"
        );
        assert!(matches!(
            decode_text("string", 0, &[0xff], StringEncoding::Utf16Le),
            Err(MappingError::InvalidEncoding { .. })
        ));
    }
}
