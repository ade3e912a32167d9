// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Map context: the evaluation environment of one decode.
//!
//! A stack of named scopes, one per structure being decoded, plus a root
//! scope holding caller-supplied values. Size, count, and condition
//! expressions resolve dotted paths by walking from the innermost scope
//! outward, so sibling structures never observe each other's members.
//!
//! Contexts are ephemeral: one per decode invocation, never shared
//! across concurrent decodes.

use crate::expression::PathResolver;
use crate::runtime::value::Value;
use std::collections::HashMap;

#[derive(Debug)]
struct Scope {
    /// Scope label, the name of the enclosing structure. The root scope
    /// is unnamed.
    name: Option<String>,
    values: HashMap<String, Value>,
}

/// Evaluation environment of decoded values for a single decode.
#[derive(Debug)]
pub struct MapContext {
    scopes: Vec<Scope>,
}

impl Default for MapContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MapContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: None,
                values: HashMap::new(),
            }],
        }
    }

    /// Create a context pre-populated with caller-supplied values.
    pub fn with_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut context = Self::new();
        for (name, value) in values {
            context.set(name, value);
        }
        context
    }

    /// Store a value in the current scope.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        // A scope always exists; new() seeds the root.
        if let Some(scope) = self.scopes.last_mut() {
            scope.values.insert(name.into(), value);
        }
    }

    /// Look up a dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        self.resolve_segments(&segments)
    }

    pub(crate) fn push_scope(&mut self, name: &str) {
        self.scopes.push(Scope {
            name: Some(name.to_string()),
            values: HashMap::new(),
        });
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Resolve path segments from the innermost scope outward.
    ///
    /// The first segment matches either a scope's label or a value local
    /// to a scope; remaining segments descend through structure members.
    pub(crate) fn resolve_segments(&self, segments: &[String]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;

        for scope in self.scopes.iter().rev() {
            if scope.name.as_deref() == Some(first.as_str()) {
                let (member, nested) = rest.split_first()?;
                if let Some(value) = scope.values.get(member) {
                    return descend(value, nested);
                }
                return None;
            }
            if let Some(value) = scope.values.get(first) {
                return descend(value, rest);
            }
        }
        None
    }
}

fn descend<'a>(mut value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    for segment in segments {
        value = value.field(segment)?;
    }
    Some(value)
}

impl PathResolver for MapContext {
    fn resolve(&self, segments: &[String]) -> Option<i64> {
        self.resolve_segments(segments)?.integer_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_scope_values() {
        let mut context = MapContext::new();
        context.set("format_version", Value::Integer(2));
        assert_eq!(
            context.get("format_version").and_then(Value::as_i64),
            Some(2)
        );
        assert!(context.get("missing").is_none());
    }

    #[test]
    fn test_scope_qualified_path() {
        let mut context = MapContext::new();
        context.push_scope("sphere3d");
        context.set("number_of_triangles", Value::UnsignedInteger(2));

        assert_eq!(
            context
                .get("sphere3d.number_of_triangles")
                .and_then(Value::as_u64),
            Some(2)
        );
        assert_eq!(
            context.get("number_of_triangles").and_then(Value::as_u64),
            Some(2)
        );
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut context = MapContext::new();
        context.push_scope("outer");
        context.set("size", Value::Integer(16));
        context.push_scope("inner");
        context.set("size", Value::Integer(4));

        assert_eq!(context.get("size").and_then(Value::as_i64), Some(4));
        assert_eq!(context.get("outer.size").and_then(Value::as_i64), Some(16));
    }

    #[test]
    fn test_sibling_scopes_do_not_collide() {
        let mut context = MapContext::new();
        context.push_scope("first");
        context.set("count", Value::Integer(1));
        context.pop_scope();
        context.push_scope("second");

        // first's locals are gone once its scope is popped.
        assert!(context.get("count").is_none());
        assert!(context.get("first.count").is_none());
    }

    #[test]
    fn test_descend_into_structure() {
        let mut context = MapContext::new();
        context.set(
            "header",
            Value::Structure(vec![("size".to_string(), Value::UnsignedInteger(64))]),
        );
        assert_eq!(context.get("header.size").and_then(Value::as_u64), Some(64));
        assert!(context.get("header.missing").is_none());
    }

    #[test]
    fn test_path_resolver_boolean_coercion() {
        use crate::expression::PathResolver;

        let mut context = MapContext::new();
        context.set("has_extra", Value::Boolean(true));
        assert_eq!(context.resolve(&["has_extra".to_string()]), Some(1));
    }
}
