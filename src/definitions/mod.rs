// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Definition model and registry.
//!
//! Immutable typed records for every data-type kind, and the registry
//! they are registered into. See the `reader` module for how YAML
//! documents become definitions and the `runtime` module for how resolved
//! definitions become byte-stream maps.

mod data_types;
mod registry;

pub use data_types::{
    BooleanDefinition, ByteOrder, CharacterDefinition, ConstantDefinition, DataSize,
    DataTypeDefinition, DataTypeRef, DefinitionId, DefinitionKind, ElementCount,
    ElementSequenceDefinition, Endianness, EnumerationDefinition, EnumerationValue,
    FixedSizeAttributes, FloatingPointDefinition, FormatDefinition, IntegerDefinition,
    IntegerFormat, LayoutElement, MemberDataType, MemberDefinition, PaddingDefinition,
    PinnedValue, StringDefinition, StringEncoding, StructureDefinition,
    StructureFamilyDefinition, StructureGroupDefinition, UnionDefinition, UuidDefinition,
};
pub use registry::DataTypeRegistry;

pub(crate) use registry::NameIndex;
