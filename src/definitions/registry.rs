// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data type definitions registry.
//!
//! An arena of definitions plus a name/alias index. Definitions are
//! identified by their lower-cased name; aliases are matched exactly.
//! Registration does not validate references, so schemas may refer to
//! definitions that appear later in the input stream; the reader runs a
//! resolution pass once every document has been ingested.

use crate::definitions::data_types::{DataTypeDefinition, DefinitionId, DefinitionKind};
use crate::error::DefinitionError;
use std::collections::HashMap;

/// Name and alias index over the definition arena.
#[derive(Debug, Default)]
pub(crate) struct NameIndex {
    by_name: HashMap<String, DefinitionId>,
    by_alias: HashMap<String, DefinitionId>,
}

impl NameIndex {
    /// Look up a definition id by name or alias.
    pub(crate) fn lookup(&self, name: &str) -> Option<DefinitionId> {
        let lookup_name = name.to_lowercase();
        self.by_name
            .get(&lookup_name)
            .or_else(|| self.by_alias.get(name))
            .copied()
    }
}

/// Registry of data type definitions.
#[derive(Debug, Default)]
pub struct DataTypeRegistry {
    definitions: Vec<DataTypeDefinition>,
    index: NameIndex,
    format_ids: Vec<DefinitionId>,
    resolved: bool,
}

impl DataTypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its name and each alias.
    ///
    /// Fails with [`DefinitionError::DuplicateName`] when the name or any
    /// alias collides with an already registered name or alias.
    pub fn register(
        &mut self,
        definition: DataTypeDefinition,
    ) -> Result<DefinitionId, DefinitionError> {
        let name_lower = definition.name.to_lowercase();
        if self.index.by_name.contains_key(&name_lower)
            || self.index.by_alias.contains_key(&definition.name)
        {
            return Err(DefinitionError::DuplicateName {
                name: definition.name.clone(),
            });
        }
        for alias in &definition.aliases {
            if self.index.by_alias.contains_key(alias)
                || self.index.by_name.contains_key(&alias.to_lowercase())
            {
                return Err(DefinitionError::DuplicateName {
                    name: alias.clone(),
                });
            }
        }

        let id = DefinitionId(self.definitions.len());
        log::debug!(
            "registering {} definition: {}",
            definition.type_indicator(),
            definition.name
        );

        self.index.by_name.insert(name_lower, id);
        for alias in &definition.aliases {
            self.index.by_alias.insert(alias.clone(), id);
        }
        if matches!(definition.kind, DefinitionKind::Format(_)) {
            self.format_ids.push(id);
        }

        self.definitions.push(definition);
        self.resolved = false;
        Ok(id)
    }

    /// Retrieve a definition by arena id.
    #[must_use]
    pub fn get(&self, id: DefinitionId) -> &DataTypeDefinition {
        &self.definitions[id.0]
    }

    /// Look up a definition by name or alias.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&DataTypeDefinition> {
        self.index.lookup(name).map(|id| self.get(id))
    }

    /// Look up a definition id by name or alias.
    #[must_use]
    pub fn lookup_id(&self, name: &str) -> Option<DefinitionId> {
        self.index.lookup(name)
    }

    /// Resolve a name to an id, failing with
    /// [`DefinitionError::UnresolvedReference`] when absent.
    pub fn resolve_name(
        &self,
        name: &str,
        referenced_by: &str,
    ) -> Result<DefinitionId, DefinitionError> {
        self.index
            .lookup(name)
            .ok_or_else(|| DefinitionError::UnresolvedReference {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }

    /// Registered `format` definitions, in registration order.
    pub fn format_definitions(&self) -> impl Iterator<Item = &DataTypeDefinition> {
        self.format_ids.iter().map(|id| self.get(*id))
    }

    /// Iterate over all definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DataTypeDefinition> {
        self.definitions.iter()
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Whether the resolution pass has completed.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Split borrow for the resolution pass: mutable definitions next to
    /// the immutable name index.
    pub(crate) fn parts_mut(&mut self) -> (&mut [DataTypeDefinition], &NameIndex) {
        (&mut self.definitions, &self.index)
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = DefinitionId> {
        (0..self.definitions.len()).map(DefinitionId)
    }
}
