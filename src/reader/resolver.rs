// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolution pass.
//!
//! Runs after all documents of a stream have been registered: substitutes
//! direct arena indices for name references, rejects ownership cycles,
//! validates structure families and groups, checks fixed sizes against
//! the per-kind allowed sets, and statically checks expression paths
//! against preceding siblings.
//!
//! Resolution is idempotent: resolving an already-resolved registry is a
//! no-op.

use crate::definitions::{
    DataTypeRef, DataTypeRegistry, DefinitionId, DefinitionKind, MemberDataType,
    MemberDefinition, NameIndex, PinnedValue, StructureDefinition,
};
use crate::error::DefinitionError;
use crate::expression::Expression;

pub(crate) fn resolve(registry: &mut DataTypeRegistry) -> Result<(), DefinitionError> {
    if registry.is_resolved() {
        return Ok(());
    }

    resolve_references(registry)?;
    detect_cycles(registry)?;
    validate_sizes(registry)?;
    validate_families(registry)?;
    validate_groups(registry)?;
    validate_expressions(registry)?;

    registry.mark_resolved();
    log::debug!("resolved {} definitions", registry.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Reference substitution
// ---------------------------------------------------------------------------

fn resolve_references(registry: &mut DataTypeRegistry) -> Result<(), DefinitionError> {
    let (definitions, index) = registry.parts_mut();
    for definition in definitions.iter_mut() {
        let owner = definition.name.clone();
        resolve_kind(&mut definition.kind, &owner, index)?;
    }
    Ok(())
}

fn resolve_reference(
    reference: &mut DataTypeRef,
    owner: &str,
    index: &NameIndex,
) -> Result<(), DefinitionError> {
    if let DataTypeRef::Named(name) = reference {
        let id = index
            .lookup(name)
            .ok_or_else(|| DefinitionError::UnresolvedReference {
                name: name.clone(),
                referenced_by: owner.to_string(),
            })?;
        *reference = DataTypeRef::Resolved(id);
    }
    Ok(())
}

fn resolve_kind(
    kind: &mut DefinitionKind,
    owner: &str,
    index: &NameIndex,
) -> Result<(), DefinitionError> {
    match kind {
        DefinitionKind::Sequence(sequence) | DefinitionKind::Stream(sequence) => {
            resolve_reference(&mut sequence.element_data_type, owner, index)
        }
        DefinitionKind::String(string) => {
            resolve_reference(&mut string.sequence.element_data_type, owner, index)
        }
        DefinitionKind::Structure(structure) => {
            for member in &mut structure.members {
                resolve_member(member, owner, index)?;
            }
            Ok(())
        }
        DefinitionKind::Union(union) => {
            for member in &mut union.members {
                resolve_member(member, owner, index)?;
            }
            Ok(())
        }
        DefinitionKind::Format(format) => {
            for element in &mut format.layout {
                resolve_reference(&mut element.data_type, owner, index)?;
            }
            Ok(())
        }
        DefinitionKind::StructureFamily(family) => {
            resolve_reference(&mut family.base, owner, index)?;
            for member in &mut family.members {
                resolve_reference(member, owner, index)?;
            }
            Ok(())
        }
        DefinitionKind::StructureGroup(group) => {
            resolve_reference(&mut group.base, owner, index)?;
            for member in &mut group.members {
                resolve_reference(member, owner, index)?;
            }
            if let Some(default) = &mut group.default {
                resolve_reference(default, owner, index)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn resolve_member(
    member: &mut MemberDefinition,
    owner: &str,
    index: &NameIndex,
) -> Result<(), DefinitionError> {
    match &mut member.data_type {
        MemberDataType::Reference(reference) => resolve_reference(reference, owner, index),
        MemberDataType::Inline(inline) => resolve_kind(&mut inline.kind, owner, index),
    }
}

// ---------------------------------------------------------------------------
// Cycle detection
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

fn detect_cycles(registry: &DataTypeRegistry) -> Result<(), DefinitionError> {
    let mut colors = vec![Color::White; registry.len()];
    for id in registry.ids() {
        visit(registry, id, &mut colors)?;
    }
    Ok(())
}

fn visit(
    registry: &DataTypeRegistry,
    id: DefinitionId,
    colors: &mut [Color],
) -> Result<(), DefinitionError> {
    match colors[id.0] {
        // A back edge during the depth-first walk means a cycle.
        Color::Gray => Err(DefinitionError::DefinitionCycle {
            name: registry.get(id).name.clone(),
        }),
        Color::Black => Ok(()),
        Color::White => {
            colors[id.0] = Color::Gray;
            let mut edges = Vec::new();
            collect_edges(&registry.get(id).kind, &mut edges);
            for edge in edges {
                visit(registry, edge, colors)?;
            }
            colors[id.0] = Color::Black;
            Ok(())
        }
    }
}

fn push_edge(edges: &mut Vec<DefinitionId>, reference: &DataTypeRef) {
    if let Some(id) = reference.id() {
        edges.push(id);
    }
}

/// Collect the ownership edges of a definition kind.
fn collect_edges(kind: &DefinitionKind, edges: &mut Vec<DefinitionId>) {
    match kind {
        DefinitionKind::Sequence(sequence) | DefinitionKind::Stream(sequence) => {
            push_edge(edges, &sequence.element_data_type);
        }
        DefinitionKind::String(string) => push_edge(edges, &string.sequence.element_data_type),
        DefinitionKind::Structure(StructureDefinition { members })
        | DefinitionKind::Union(crate::definitions::UnionDefinition { members }) => {
            for member in members {
                match &member.data_type {
                    MemberDataType::Reference(reference) => push_edge(edges, reference),
                    MemberDataType::Inline(inline) => collect_edges(&inline.kind, edges),
                }
            }
        }
        DefinitionKind::Format(format) => {
            for element in &format.layout {
                push_edge(edges, &element.data_type);
            }
        }
        DefinitionKind::StructureFamily(family) => {
            push_edge(edges, &family.base);
            for member in &family.members {
                push_edge(edges, member);
            }
        }
        DefinitionKind::StructureGroup(group) => {
            push_edge(edges, &group.base);
            for member in &group.members {
                push_edge(edges, member);
            }
            if let Some(default) = &group.default {
                push_edge(edges, default);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Size validation
// ---------------------------------------------------------------------------

fn validate_sizes(registry: &DataTypeRegistry) -> Result<(), DefinitionError> {
    for definition in registry.iter() {
        let allowed: &[u64] = match &definition.kind {
            DefinitionKind::Boolean(_) | DefinitionKind::Character(_) => &[1, 2, 4],
            DefinitionKind::Integer(_) => &[1, 2, 4, 8],
            DefinitionKind::FloatingPoint(_) => &[4, 8],
            DefinitionKind::Uuid(_) => &[16],
            _ => continue,
        };

        let size = definition
            .fixed_size_attributes()
            .and_then(crate::definitions::FixedSizeAttributes::byte_size);
        match size {
            Some(size) if allowed.contains(&size) => {}
            Some(size) => {
                return Err(DefinitionError::Schema {
                    name: definition.name.clone(),
                    message: format!("unsupported size: {}", size),
                })
            }
            None => {
                return Err(DefinitionError::Schema {
                    name: definition.name.clone(),
                    message: "missing size attribute".to_string(),
                })
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Structure families
// ---------------------------------------------------------------------------

fn structure_of<'a>(
    registry: &'a DataTypeRegistry,
    reference: &DataTypeRef,
) -> Option<(&'a str, &'a StructureDefinition)> {
    let definition = registry.get(reference.id()?);
    match &definition.kind {
        DefinitionKind::Structure(structure) => Some((&definition.name, structure)),
        _ => None,
    }
}

/// Kind indicator and byte size of a member's data type, for
/// compatibility checks.
fn member_type_info(
    registry: &DataTypeRegistry,
    member: &MemberDefinition,
) -> (&'static str, Option<u64>) {
    match &member.data_type {
        MemberDataType::Reference(reference) => match reference.id() {
            Some(id) => {
                let definition = registry.get(id);
                (definition.type_indicator(), definition.byte_size(registry))
            }
            None => ("<unresolved>", None),
        },
        MemberDataType::Inline(inline) => {
            (inline.type_indicator(), inline.byte_size(registry))
        }
    }
}

fn validate_families(registry: &DataTypeRegistry) -> Result<(), DefinitionError> {
    for definition in registry.iter() {
        let family = match &definition.kind {
            DefinitionKind::StructureFamily(family) => family,
            _ => continue,
        };
        let mismatch = |member: &str, message: String| DefinitionError::FamilyMemberMismatch {
            family: definition.name.clone(),
            member: member.to_string(),
            message,
        };

        let (_, base) = structure_of(registry, &family.base).ok_or_else(|| {
            mismatch("<base>", "base is not a structure".to_string())
        })?;

        for member_reference in &family.members {
            let (variant_name, variant) = structure_of(registry, member_reference)
                .ok_or_else(|| mismatch("<member>", "member is not a structure".to_string()))?;

            // Every variant must expose all base members with compatible
            // data types.
            for base_member in &base.members {
                let member_name = base_member.display_name();
                let variant_member = variant.member(member_name).ok_or_else(|| {
                    mismatch(
                        variant_name,
                        format!("missing base member: {}", member_name),
                    )
                })?;

                let (base_kind, base_size) = member_type_info(registry, base_member);
                let (variant_kind, variant_size) = member_type_info(registry, variant_member);
                if base_kind != variant_kind || base_size != variant_size {
                    return Err(mismatch(
                        variant_name,
                        format!("incompatible data type for base member: {}", member_name),
                    ));
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Structure groups
// ---------------------------------------------------------------------------

fn validate_groups(registry: &DataTypeRegistry) -> Result<(), DefinitionError> {
    for definition in registry.iter() {
        let group = match &definition.kind {
            DefinitionKind::StructureGroup(group) => group,
            _ => continue,
        };
        let invalid = |member: &str, message: &str| DefinitionError::GroupMemberInvalid {
            group: definition.name.clone(),
            member: member.to_string(),
            message: message.to_string(),
        };

        let (base_name, base) = structure_of(registry, &group.base)
            .ok_or_else(|| invalid("<base>", "base is not a structure"))?;
        if base.member(&group.identifier).is_none() {
            return Err(invalid(base_name, "base does not define the identifier member"));
        }

        let mut seen: Vec<&PinnedValue> = Vec::new();
        for member_reference in &group.members {
            let (member_name, member) = structure_of(registry, member_reference)
                .ok_or_else(|| invalid("<member>", "member is not a structure"))?;

            let identifier_member = member
                .member(&group.identifier)
                .ok_or_else(|| invalid(member_name, "missing the identifier member"))?;
            if identifier_member.pinned_values.is_empty() {
                return Err(invalid(member_name, "identifier member has no pinned value"));
            }

            for pin in &identifier_member.pinned_values {
                if seen.contains(&pin) {
                    return Err(DefinitionError::GroupDiscriminantCollision {
                        group: definition.name.clone(),
                        value: pin.to_string(),
                    });
                }
                seen.push(pin);
            }
        }

        if let Some(default) = &group.default {
            structure_of(registry, default)
                .ok_or_else(|| invalid("<default>", "default is not a structure"))?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Expression path checks
// ---------------------------------------------------------------------------

/// Statically check that expression paths on structure members reference
/// preceding siblings.
///
/// A path rooted outside the structure (an ancestor scope or a
/// caller-supplied value) cannot be checked here; only references to
/// members of the same structure that have not yet been decoded are
/// rejected.
fn validate_expressions(registry: &DataTypeRegistry) -> Result<(), DefinitionError> {
    for definition in registry.iter() {
        let structure = match &definition.kind {
            DefinitionKind::Structure(structure) => structure,
            _ => continue,
        };

        let member_names: Vec<&str> = structure
            .members
            .iter()
            .filter_map(|member| member.name.as_deref())
            .collect();
        let mut preceding: Vec<&str> = Vec::new();

        for member in &structure.members {
            let label = format!("{}.{}", definition.name, member.display_name());

            let mut expressions: Vec<&Expression> = Vec::new();
            if let Some(condition) = &member.condition {
                expressions.push(condition);
            }
            if let MemberDataType::Inline(inline) = &member.data_type {
                let sequence = match &inline.kind {
                    DefinitionKind::Sequence(sequence) | DefinitionKind::Stream(sequence) => {
                        Some(sequence)
                    }
                    DefinitionKind::String(string) => Some(&string.sequence),
                    _ => None,
                };
                if let Some(sequence) = sequence {
                    for count in [&sequence.number_of_elements, &sequence.elements_data_size] {
                        if let Some(crate::definitions::ElementCount::Expression(expression)) =
                            count
                        {
                            expressions.push(expression);
                        }
                    }
                }
            }

            for expression in expressions {
                let mut paths: Vec<Vec<String>> = Vec::new();
                expression.for_each_path(&mut |segments| paths.push(segments.to_vec()));

                for path in &paths {
                    let root = match path.first() {
                        Some(root) => root.as_str(),
                        None => continue,
                    };
                    // Qualified by the structure's own name.
                    let local = if root == definition.name {
                        match path.get(1) {
                            Some(second) => second.as_str(),
                            None => continue,
                        }
                    } else {
                        root
                    };

                    let is_following = member_names.contains(&local)
                        && !preceding.contains(&local);
                    if is_following {
                        return Err(DefinitionError::Schema {
                            name: label.clone(),
                            message: format!(
                                "expression references member not yet decoded: {}",
                                path.join(".")
                            ),
                        });
                    }
                }
            }

            if let Some(member_name) = member.name.as_deref() {
                preceding.push(member_name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::DefinitionsReader;

    #[test]
    fn test_resolution_is_idempotent() {
        let mut registry = DefinitionsReader::read(
            "name: int32\n\
             type: integer\n\
             attributes: {size: 4}\n",
        )
        .unwrap();
        assert!(registry.is_resolved());
        resolve(&mut registry).unwrap();
        assert!(registry.is_resolved());
    }

    #[test]
    fn test_unresolved_reference() {
        let result = DefinitionsReader::read(
            "name: point3d\n\
             type: structure\n\
             members:\n\
             - name: x\n\
             \x20 data_type: int32\n",
        );
        assert!(matches!(
            result,
            Err(DefinitionError::UnresolvedReference { name, referenced_by })
                if name == "int32" && referenced_by == "point3d"
        ));
    }

    #[test]
    fn test_definition_cycle() {
        let result = DefinitionsReader::read(
            "name: ouroboros\n\
             type: structure\n\
             members:\n\
             - name: tail\n\
             \x20 data_type: ouroboros\n",
        );
        assert!(matches!(
            result,
            Err(DefinitionError::DefinitionCycle { name }) if name == "ouroboros"
        ));
    }

    #[test]
    fn test_indirect_cycle() {
        let result = DefinitionsReader::read(
            "name: first\n\
             type: structure\n\
             members:\n\
             - name: second\n\
             \x20 data_type: second\n\
             ---\n\
             name: second\n\
             type: sequence\n\
             element_data_type: first\n\
             number_of_elements: 1\n",
        );
        assert!(matches!(result, Err(DefinitionError::DefinitionCycle { .. })));
    }

    #[test]
    fn test_illegal_size() {
        let result = DefinitionsReader::read(
            "name: int24\n\
             type: integer\n\
             attributes: {size: 3}\n",
        );
        assert!(matches!(
            result,
            Err(DefinitionError::Schema { name, .. }) if name == "int24"
        ));
    }

    #[test]
    fn test_native_size_rejected() {
        let result = DefinitionsReader::read("name: int\ntype: integer\n");
        assert!(matches!(result, Err(DefinitionError::Schema { .. })));
    }

    #[test]
    fn test_expression_referencing_following_member() {
        let result = DefinitionsReader::read(
            "name: uint32\n\
             type: integer\n\
             attributes: {format: unsigned, size: 4}\n\
             ---\n\
             name: broken\n\
             type: structure\n\
             members:\n\
             - name: data\n\
             \x20 type: stream\n\
             \x20 element_data_type: uint32\n\
             \x20 number_of_elements: data_size\n\
             - name: data_size\n\
             \x20 data_type: uint32\n",
        );
        assert!(matches!(
            result,
            Err(DefinitionError::Schema { name, .. }) if name == "broken.data"
        ));
    }
}
