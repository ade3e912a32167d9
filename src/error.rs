// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.
//!
//! Two surfaces: [`DefinitionError`] for everything that can go wrong while
//! reading and resolving a schema, and [`MappingError`] for failures while
//! mapping a byte stream onto a resolved definition. Schema errors abort
//! registration; mapping errors abort the in-progress decode.

use crate::expression::ExpressionError;
use thiserror::Error;

/// Errors raised while reading, registering, or resolving definitions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Malformed YAML in the definition stream.
    #[error("document {document}: {source}")]
    Yaml {
        /// Zero-based index of the offending YAML document.
        document: usize,
        source: serde_yaml::Error,
    },

    /// Missing or unsupported attribute, illegal size, malformed member.
    #[error("in: {name}: {message}")]
    Schema { name: String, message: String },

    /// A definition name or alias is already registered.
    #[error("definition already set for name: {name}")]
    DuplicateName { name: String },

    /// A name reference does not resolve to a registered definition.
    #[error("in: {referenced_by}: undefined data type: {name}")]
    UnresolvedReference { name: String, referenced_by: String },

    /// The ownership graph (structure -> member type, sequence -> element
    /// type) contains a cycle.
    #[error("definition cycle involving: {name}")]
    DefinitionCycle { name: String },

    /// A structure-family member does not expose a base member with a
    /// compatible data type.
    #[error("in family: {family}: member: {member}: {message}")]
    FamilyMemberMismatch {
        family: String,
        member: String,
        message: String,
    },

    /// A structure-group member is not a structure, lacks the identifier
    /// member, or does not pin it with a value.
    #[error("in group: {group}: member: {member}: {message}")]
    GroupMemberInvalid {
        group: String,
        member: String,
        message: String,
    },

    /// Two structure-group members pin the discriminant to the same value.
    #[error("in group: {group}: duplicate discriminant value: {value}")]
    GroupDiscriminantCollision { group: String, value: String },

    /// A size, count, or condition expression failed to parse.
    #[error("in: {name}: {source}")]
    ExpressionSyntax {
        name: String,
        source: ExpressionError,
    },
}

/// Errors raised while mapping a byte stream or folding a value.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Not enough bytes left in the stream for the requested decode.
    #[error(
        "in: {name}: byte stream too small at offset {offset}: \
         requested {needed}, available {available}"
    )]
    ByteStreamTooSmall {
        name: String,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Decoded integer matches neither the false value nor the true value.
    #[error("in: {name}: unsupported boolean value {value} at offset {offset}")]
    InvalidBooleanEncoding {
        name: String,
        offset: usize,
        value: u64,
    },

    /// Byte sequence is not valid in the declared string or character
    /// encoding.
    #[error("in: {name}: invalid encoding at offset {offset}: {message}")]
    InvalidEncoding {
        name: String,
        offset: usize,
        message: String,
    },

    /// A member value does not match its pinned value or value set.
    #[error("in: {name}: member: {member}: value mismatch at offset {offset}")]
    ConstantMismatch {
        name: String,
        member: String,
        offset: usize,
    },

    /// An elements data size did not land on an element boundary.
    #[error("in: {name}: elements data size ends between element boundaries at offset {offset}")]
    TrailingBytes { name: String, offset: usize },

    /// No structure-group variant pins the observed discriminant and the
    /// group declares no default.
    #[error("in: {name}: no variant for {identifier} value {value}")]
    UnknownGroupVariant {
        name: String,
        identifier: String,
        value: String,
    },

    /// The requested structure-family variant is not a family member.
    #[error("in: {family}: unknown variant: {variant}")]
    UnknownFamilyVariant { family: String, variant: String },

    /// A structure family was mapped without selecting a variant first.
    #[error("in: {family}: no family variant selected")]
    FamilyVariantNotSelected { family: String },

    /// An element count or size expression produced a negative value.
    #[error("in: {name}: invalid element count: {value}")]
    InvalidElementCount { name: String, value: i64 },

    /// An expression referenced a path the map context does not define.
    #[error("in: {name}: unbound expression path: {path}")]
    UnboundExpressionPath { name: String, path: String },

    /// An expression failed to evaluate.
    #[error("in: {name}: {source}")]
    ExpressionEvaluation {
        name: String,
        source: ExpressionError,
    },

    /// The definition kind has no byte-stream representation.
    #[error("unable to map {kind} data type: {name}")]
    UnmappableKind { name: String, kind: &'static str },

    /// The supplied value does not match the definition when folding.
    #[error("in: {name}: unable to fold value: {message}")]
    FoldingUnsupported { name: String, message: String },
}
