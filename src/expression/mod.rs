// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Size, count, and condition expressions.
//!
//! Data type definitions may describe the number of sequence elements, the
//! elements data size, or the presence of a structure member with a small
//! arithmetic expression over previously decoded values.
//!
//! # Supported Syntax
//!
//! ```text
//! expr      ::= term (('+' | '-') term)*
//! term      ::= factor (('*' | '/' | '%') factor)*
//! factor    ::= integer | path | '(' expr ')'
//! path      ::= name ('.' name)*
//! condition ::= expr relop expr
//! relop     ::= '==' | '!=' | '<' | '<=' | '>' | '>='
//! ```
//!
//! Expressions are parsed once at schema-read time into an [`Expression`]
//! AST; decoding only walks the tree. Paths resolve against the decode
//! context through the [`PathResolver`] trait.

mod evaluator;
mod parser;

pub use evaluator::{ExpressionValue, PathResolver};
pub use parser::{BinaryOperator, CompareOperator, Expression};

use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// Invalid expression syntax.
    #[error("expression syntax error at offset {position}: {message}")]
    Syntax { message: String, position: usize },

    /// Empty expression string.
    #[error("empty expression")]
    Empty,

    /// A referenced path is not defined by the evaluation context.
    #[error("unbound path: {0}")]
    UnboundPath(String),

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflow during evaluation.
    #[error("arithmetic overflow")]
    Overflow,

    /// An integer was required but the expression produced a boolean, or
    /// the other way around.
    #[error("expression does not result in {expected}")]
    ResultType { expected: &'static str },
}
