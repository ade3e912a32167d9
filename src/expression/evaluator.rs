// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Expression evaluation.
//!
//! Walks a parsed [`Expression`] against a path resolver, typically the
//! decode context. Arithmetic is 64-bit signed with checked operations;
//! division and modulo truncate toward zero.

use super::{BinaryOperator, CompareOperator, Expression, ExpressionError};

/// Result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionValue {
    Integer(i64),
    Boolean(bool),
}

/// Resolves dotted paths to integer values during evaluation.
pub trait PathResolver {
    /// Look up a path, returning its integer value.
    ///
    /// Returns `None` if the path is not defined.
    fn resolve(&self, segments: &[String]) -> Option<i64>;
}

impl Expression {
    /// Evaluate the expression against a path resolver.
    pub fn evaluate<R: PathResolver>(
        &self,
        resolver: &R,
    ) -> Result<ExpressionValue, ExpressionError> {
        match self {
            Expression::Comparison {
                operator,
                left,
                right,
            } => {
                let left = left.evaluate_integer(resolver)?;
                let right = right.evaluate_integer(resolver)?;
                let result = match operator {
                    CompareOperator::Eq => left == right,
                    CompareOperator::Ne => left != right,
                    CompareOperator::Lt => left < right,
                    CompareOperator::Le => left <= right,
                    CompareOperator::Gt => left > right,
                    CompareOperator::Ge => left >= right,
                };
                Ok(ExpressionValue::Boolean(result))
            }
            _ => Ok(ExpressionValue::Integer(self.evaluate_integer(resolver)?)),
        }
    }

    /// Evaluate, requiring an integer result.
    pub fn evaluate_integer<R: PathResolver>(
        &self,
        resolver: &R,
    ) -> Result<i64, ExpressionError> {
        match self {
            Expression::Integer(value) => Ok(*value),
            Expression::Path(segments) => resolver
                .resolve(segments)
                .ok_or_else(|| ExpressionError::UnboundPath(segments.join("."))),
            Expression::Binary {
                operator,
                left,
                right,
            } => {
                let left = left.evaluate_integer(resolver)?;
                let right = right.evaluate_integer(resolver)?;
                match operator {
                    BinaryOperator::Add => left.checked_add(right),
                    BinaryOperator::Subtract => left.checked_sub(right),
                    BinaryOperator::Multiply => left.checked_mul(right),
                    BinaryOperator::Divide => {
                        if right == 0 {
                            return Err(ExpressionError::DivisionByZero);
                        }
                        left.checked_div(right)
                    }
                    BinaryOperator::Modulo => {
                        if right == 0 {
                            return Err(ExpressionError::DivisionByZero);
                        }
                        left.checked_rem(right)
                    }
                }
                .ok_or(ExpressionError::Overflow)
            }
            Expression::Comparison { .. } => Err(ExpressionError::ResultType {
                expected: "an integer",
            }),
        }
    }

    /// Evaluate, requiring a boolean result.
    pub fn evaluate_condition<R: PathResolver>(
        &self,
        resolver: &R,
    ) -> Result<bool, ExpressionError> {
        match self.evaluate(resolver)? {
            ExpressionValue::Boolean(result) => Ok(result),
            ExpressionValue::Integer(_) => Err(ExpressionError::ResultType {
                expected: "a boolean",
            }),
        }
    }
}
