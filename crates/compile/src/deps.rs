//! Lifting of happens-before edges to the lowest common scope.

use crate::error::CompileError;
use crate::scope::Ancestry;
use crate::types::{GroupId, Param, Pipeline};
use std::collections::{BTreeMap, BTreeSet};

/// For every group and op, the sibling entities it must run after.
///
/// An edge exists from a consumer to a producer when the producer is named
/// by any of the consumer's parameters, any predicate guarding it, or its
/// explicit dependency list. Each edge is recorded between the first
/// divergent ancestors of the two entities, so every emitted dependency
/// connects siblings within one shared parent group.
pub fn lift_dependencies(
    pipeline: &Pipeline,
    ancestry: &Ancestry,
    guarded: &BTreeMap<String, BTreeSet<Param>>,
) -> Result<BTreeMap<String, BTreeSet<String>>, CompileError> {
    let mut dependencies = BTreeMap::new();

    for op in pipeline.ops.values() {
        let mut upstream = BTreeSet::new();
        let predicates = guarded.get(&op.name).into_iter().flatten();
        for param in op.inputs.iter().chain(predicates) {
            if let Some(producer) = param.producer() {
                upstream.insert(producer.to_string());
            }
        }
        upstream.extend(op.dependent_names.iter().cloned());
        record_edges(&mut dependencies, pipeline, ancestry, &upstream, &op.name)?;
    }

    group_edges(pipeline, ancestry, guarded, pipeline.root, &mut dependencies)?;
    Ok(dependencies)
}

fn record_edges(
    dependencies: &mut BTreeMap<String, BTreeSet<String>>,
    pipeline: &Pipeline,
    ancestry: &Ancestry,
    upstream: &BTreeSet<String>,
    downstream: &str,
) -> Result<(), CompileError> {
    for name in upstream {
        if !pipeline.ops.contains_key(name) && !ancestry.groups.contains_key(name) {
            return Err(CompileError::UnknownDependency(name.clone()));
        }
        let (up, down) = ancestry.uncommon_ancestors(name, downstream)?;
        let (Some(first_up), Some(first_down)) = (up.first(), down.first()) else {
            continue;
        };
        dependencies
            .entry(first_down.clone())
            .or_default()
            .insert(first_up.clone());
    }
    Ok(())
}

/// Record the edges implied by groups: recursive groups depend on the
/// producers of their parameters, other groups on their explicit list.
fn group_edges(
    pipeline: &Pipeline,
    ancestry: &Ancestry,
    guarded: &BTreeMap<String, BTreeSet<Param>>,
    id: GroupId,
    dependencies: &mut BTreeMap<String, BTreeSet<String>>,
) -> Result<(), CompileError> {
    let group = pipeline.group(id);
    let mut upstream = BTreeSet::new();
    if group.is_recursive() {
        let predicates = guarded.get(&group.name).into_iter().flatten();
        for param in group.inputs.iter().chain(predicates) {
            if let Some(producer) = param.producer() {
                upstream.insert(producer.to_string());
            }
        }
    } else {
        upstream.extend(group.dependencies.iter().cloned());
    }
    record_edges(dependencies, pipeline, ancestry, &upstream, &group.name)?;

    for &child in &group.groups {
        group_edges(pipeline, ancestry, guarded, child, dependencies)?;
    }
    Ok(())
}
