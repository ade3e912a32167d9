// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dtfabric - declarative binary format parsing
//!
//! A schema-driven toolkit for binary formats: describe the layout of a
//! format in a YAML definition language and decode byte buffers through
//! runtime data type maps. The schema is the source of truth; there are
//! no hand-written parsers.
//!
//! ## Quick Start
//!
//! ```rust
//! use dtfabric::Fabric;
//!
//! let mut fabric = Fabric::from_yaml(
//!     "name: int32le\n\
//!      type: integer\n\
//!      attributes:\n\
//!      \x20 byte_order: little-endian\n\
//!      \x20 format: signed\n\
//!      \x20 size: 4\n\
//!      ---\n\
//!      name: point3d\n\
//!      type: structure\n\
//!      members:\n\
//!      - name: x\n\
//!      \x20 data_type: int32le\n\
//!      - name: y\n\
//!      \x20 data_type: int32le\n\
//!      - name: z\n\
//!      \x20 data_type: int32le\n",
//! )?;
//!
//! let map = fabric.data_type_map("point3d")?;
//! let bytes = [
//!     0x01, 0x00, 0x00, 0x00, 0xfe, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00,
//! ];
//! let (point, consumed) = map.map_byte_stream(&bytes)?;
//!
//! assert_eq!(consumed, 12);
//! assert_eq!(point.field("y").and_then(|v| v.as_i64()), Some(-2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! YAML documents -> DefinitionsReader -> DataTypeRegistry
//!                                             |
//!                                     DataTypeMapFactory
//!                                             |
//!                                        DataTypeMap
//!                                             |
//!                       map_byte_stream(bytes) -> (Value, consumed)
//! ```
//!
//! ## Modules Overview
//!
//! - [`definitions`] - the typed definition model and registry
//! - [`reader`] - YAML ingestion, validation, and reference resolution
//! - [`expression`] - size/count/condition expression parsing and
//!   evaluation
//! - [`runtime`] - data type maps, map contexts, and decoded values

pub mod definitions;
pub mod error;
pub mod expression;
pub mod fabric;
pub mod reader;
pub mod runtime;

pub use definitions::{DataTypeDefinition, DataTypeRegistry, DefinitionKind};
pub use error::{DefinitionError, MappingError};
pub use expression::{Expression, ExpressionError};
pub use fabric::Fabric;
pub use reader::DefinitionsReader;
pub use runtime::{DataTypeMap, DataTypeMapFactory, MapContext, Value};
