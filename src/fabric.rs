// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One-shot front door: schema text in, data type maps out.

use crate::definitions::DataTypeRegistry;
use crate::error::DefinitionError;
use crate::reader::DefinitionsReader;
use crate::runtime::{DataTypeMap, DataTypeMapFactory};
use std::sync::Arc;

/// A read and resolved schema with its map factory.
///
/// Wraps the reader, registry, and factory for the common case of one
/// schema serving many decodes.
///
/// # Example
///
/// ```rust
/// use dtfabric::Fabric;
///
/// let mut fabric = Fabric::from_yaml(
///     "name: uint32le\n\
///      type: integer\n\
///      attributes:\n\
///      \x20 byte_order: little-endian\n\
///      \x20 format: unsigned\n\
///      \x20 size: 4\n",
/// )?;
/// let map = fabric.data_type_map("uint32le")?;
/// let (value, _) = map.map_byte_stream(&[0x01, 0x00, 0x00, 0x00])?;
/// assert_eq!(value.as_u64(), Some(1));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Fabric {
    factory: DataTypeMapFactory,
}

impl Fabric {
    /// Read and resolve a YAML definitions stream.
    pub fn from_yaml(yaml: &str) -> Result<Self, DefinitionError> {
        let registry = DefinitionsReader::read(yaml)?;
        Ok(Self {
            factory: DataTypeMapFactory::new(registry),
        })
    }

    /// The resolved definitions registry.
    #[must_use]
    pub fn registry(&self) -> &DataTypeRegistry {
        self.factory.registry()
    }

    /// Create (or fetch the cached) data type map for a definition.
    pub fn data_type_map(&mut self, name: &str) -> Result<Arc<DataTypeMap>, DefinitionError> {
        self.factory.create(name)
    }
}
