// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime mapping of byte streams onto resolved definitions.
//!
//! # Features
//!
//! - **DataTypeMap**: immutable decode engine, one variant per kind
//! - **DataTypeMapFactory**: recursive map construction with caching
//! - **MapContext**: scoped environment for size/count/condition
//!   expressions
//! - **Value**: language-neutral decoded values
//! - **Folding**: encoding values back into bytes
//!
//! # Example
//!
//! ```rust
//! use dtfabric::{DataTypeMapFactory, DefinitionsReader};
//!
//! let registry = DefinitionsReader::read(
//!     "name: uint16le\n\
//!      type: integer\n\
//!      attributes:\n\
//!      \x20 byte_order: little-endian\n\
//!      \x20 format: unsigned\n\
//!      \x20 size: 2\n",
//! )?;
//! let mut factory = DataTypeMapFactory::new(registry);
//! let map = factory.create("uint16le")?;
//!
//! let (value, consumed) = map.map_byte_stream(&[0x34, 0x12])?;
//! assert_eq!(value.as_u64(), Some(0x1234));
//! assert_eq!(consumed, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod context;
mod data_maps;
mod fold;
mod value;

pub use context::MapContext;
pub use data_maps::{
    BooleanMap, CharacterMap, ConstantMap, DataTypeMap, DataTypeMapFactory, EnumerationMap,
    FloatingPointMap, FormatMap, IntegerMap, PaddingMap, SequenceMap, StreamMap, StringMap,
    StructureFamilyMap, StructureGroupMap, StructureMap, UnionMap, UuidMap,
};
pub use value::Value;
