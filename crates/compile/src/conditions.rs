//! Propagation of condition predicates to the entities they guard.

use crate::types::{GroupId, GroupKind, Operand, Param, Pipeline};
use std::collections::{BTreeMap, BTreeSet};

/// For every op and recursive group, the predicate parameters in force at
/// that entity.
///
/// A depth-first walk carries an accumulated list of predicate parameters.
/// Entering a condition group appends each of its operands that is a
/// parameter reference; the accumulator is copy-on-write, so a parent's list
/// is never mutated by a subtree. Entities guarded by no condition have no
/// entry.
pub fn condition_params(pipeline: &Pipeline) -> BTreeMap<String, BTreeSet<Param>> {
    let mut guarded = BTreeMap::new();
    collect(pipeline, pipeline.root, &[], &mut guarded);
    guarded
}

fn collect(
    pipeline: &Pipeline,
    id: GroupId,
    inherited: &[Param],
    guarded: &mut BTreeMap<String, BTreeSet<Param>>,
) {
    let group = pipeline.group(id);
    let extended;
    let in_force: &[Param] = if let GroupKind::Condition(condition) = &group.kind {
        let mut params = inherited.to_vec();
        for operand in [&condition.operand1, &condition.operand2] {
            if let Operand::Param(param) = operand {
                params.push(param.clone());
            }
        }
        extended = params;
        &extended
    } else {
        inherited
    };

    for op in &group.ops {
        record(guarded, op, in_force);
    }
    for &child in &group.groups {
        let child_group = pipeline.group(child);
        if child_group.is_recursive() {
            // Recursive groups receive the predicates like ops do; their
            // subtree is embodied by the recursion target.
            record(guarded, &child_group.name, in_force);
        } else {
            collect(pipeline, child, in_force, guarded);
        }
    }
}

fn record(guarded: &mut BTreeMap<String, BTreeSet<Param>>, name: &str, params: &[Param]) {
    if params.is_empty() {
        return;
    }
    guarded
        .entry(name.to_string())
        .or_default()
        .extend(params.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Condition, ConditionOperator, Group, Op};

    fn condition(param: &str) -> GroupKind {
        GroupKind::Condition(Condition {
            operand1: Operand::Param(Param::pipeline_input(param)),
            operator: ConditionOperator::Eq,
            operand2: Operand::Literal("true".to_string()),
        })
    }

    #[test]
    fn nested_conditions_accumulate() {
        let mut pipeline = Pipeline::new("demo");
        let outer = pipeline.add_group(pipeline.root, Group::new("outer", condition("a")));
        let inner = pipeline.add_group(outer, Group::new("inner", condition("b")));
        pipeline.add_op(inner, Op::container("leaf", "img"));

        let guarded = condition_params(&pipeline);
        let leaf = &guarded["leaf"];
        assert!(leaf.contains(&Param::pipeline_input("a")));
        assert!(leaf.contains(&Param::pipeline_input("b")));
    }

    #[test]
    fn siblings_of_a_condition_are_unguarded() {
        let mut pipeline = Pipeline::new("demo");
        let cond = pipeline.add_group(pipeline.root, Group::new("cond", condition("a")));
        pipeline.add_op(cond, Op::container("guarded", "img"));
        pipeline.add_op(pipeline.root, Op::container("free", "img"));

        let guarded = condition_params(&pipeline);
        assert!(guarded.contains_key("guarded"));
        assert!(!guarded.contains_key("free"));
    }

    #[test]
    fn literal_operands_are_not_predicates() {
        let mut pipeline = Pipeline::new("demo");
        let kind = GroupKind::Condition(Condition {
            operand1: Operand::Literal("1".to_string()),
            operator: ConditionOperator::Eq,
            operand2: Operand::Literal("1".to_string()),
        });
        let cond = pipeline.add_group(pipeline.root, Group::new("cond", kind));
        pipeline.add_op(cond, Op::container("leaf", "img"));

        assert!(condition_params(&pipeline).is_empty());
    }

    #[test]
    fn recursive_groups_receive_predicates() {
        let mut pipeline = Pipeline::new("demo");
        let entry = pipeline.add_group(pipeline.root, Group::new("entry", condition("flag")));
        pipeline.add_group(entry, Group::new("again", GroupKind::Recursive { target: entry }));

        let guarded = condition_params(&pipeline);
        assert!(guarded["again"].contains(&Param::pipeline_input("flag")));
    }
}
