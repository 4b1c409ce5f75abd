//! Lifting of parameters into group inputs and outputs across scopes.
//!
//! A parameter produced inside one nested group and consumed inside another
//! must be lifted as an output up the producer's ancestors to the lowest
//! common ancestor, then threaded as an input down each enclosing group on
//! the consumer's side. This module decides, for every group and op, which
//! parameters it exposes and where each value comes from.

use crate::error::CompileError;
use crate::scope::Ancestry;
use crate::types::{GroupId, Param, Pipeline};
use std::collections::{BTreeMap, BTreeSet};

/// A lifted parameter: its full name plus the sibling marker.
///
/// For inputs, a marker of `Some(task)` means the value is read from the
/// sibling task of that name; `None` means the enclosing scope supplies it.
/// For outputs, `Some(child)` names the child task the value bubbles up
/// from; `None` means the value originates at the entity itself.
pub type LiftedParam = (String, Option<String>);

/// The lifted inputs and outputs of every group and op, keyed by name.
///
/// Entries are unordered sets; identical `(full_name, marker)` pairs
/// coalesce. Ops appear alongside groups because an op's entry drives the
/// argument list of its task in the enclosing DAG.
#[derive(Debug, Clone, Default)]
pub struct GroupIo {
    /// Parameters each entity must receive.
    pub inputs: BTreeMap<String, BTreeSet<LiftedParam>>,
    /// Parameters each entity must expose upward.
    pub outputs: BTreeMap<String, BTreeSet<LiftedParam>>,
}

impl GroupIo {
    fn add_input(&mut self, entity: &str, full_name: &str, marker: Option<String>) {
        self.inputs
            .entry(entity.to_string())
            .or_default()
            .insert((full_name.to_string(), marker));
    }

    fn add_output(&mut self, entity: &str, full_name: &str, marker: Option<String>) {
        self.outputs
            .entry(entity.to_string())
            .or_default()
            .insert((full_name.to_string(), marker));
    }
}

/// Decide which group or op exposes which parameter as an input or output.
///
/// Every op's declared inputs and guarding predicates are lifted first, then
/// every recursive group's declared inputs and predicates. Immediate-valued
/// parameters are never surfaced.
pub fn lift_io(
    pipeline: &Pipeline,
    ancestry: &Ancestry,
    guarded: &BTreeMap<String, BTreeSet<Param>>,
) -> Result<GroupIo, CompileError> {
    let mut io = GroupIo::default();

    for op in pipeline.ops.values() {
        let predicates = guarded.get(&op.name).into_iter().flatten();
        for param in op.inputs.iter().chain(predicates) {
            if param.is_immediate() {
                continue;
            }
            let full_name = param.full_name();
            if let Some(producer) = param.producer() {
                lift_produced(&mut io, ancestry, producer, &op.name, &full_name, false)?;
            } else if !op.is_exit_handler {
                // A pipeline input: every enclosing group threads it down.
                for entity in ancestry.ancestors(&op.name)? {
                    io.add_input(entity, &full_name, None);
                }
            }
        }
    }

    lift_recursive_groups(pipeline, ancestry, guarded, pipeline.root, &mut io)?;
    Ok(io)
}

/// Lift one produced parameter from its producing op to a consumer.
///
/// The first divergent group on the consumer's side reads from the first
/// divergent group on the producer's side; deeper consumer groups read from
/// their parent. On the producer's side every divergent group exposes the
/// value, each reading from the next group down, the last from the producer
/// itself. `suppress_deepest` drops the input on the consumer itself, used
/// for predicates reaching a recursive group: recursion does not pass
/// predicates down as explicit arguments.
fn lift_produced(
    io: &mut GroupIo,
    ancestry: &Ancestry,
    producer: &str,
    consumer: &str,
    full_name: &str,
    suppress_deepest: bool,
) -> Result<(), CompileError> {
    let (up, down) = ancestry.uncommon_ancestors(producer, consumer)?;
    let Some(first_up) = up.first() else {
        return Ok(());
    };
    for (i, entity) in down.iter().enumerate() {
        if i == 0 {
            io.add_input(entity, full_name, Some(first_up.clone()));
        } else if suppress_deepest && i == down.len() - 1 {
            continue;
        } else {
            io.add_input(entity, full_name, None);
        }
    }
    for (i, entity) in up.iter().enumerate() {
        io.add_output(entity, full_name, up.get(i + 1).cloned());
    }
    Ok(())
}

/// Propagate the declared inputs and predicates of recursive groups to their
/// ancestor groups, walking the whole tree.
fn lift_recursive_groups(
    pipeline: &Pipeline,
    ancestry: &Ancestry,
    guarded: &BTreeMap<String, BTreeSet<Param>>,
    id: GroupId,
    io: &mut GroupIo,
) -> Result<(), CompileError> {
    let group = pipeline.group(id);
    if group.is_recursive() {
        let declared = group.inputs.iter().map(|param| (param, false));
        let predicates = guarded
            .get(&group.name)
            .into_iter()
            .flatten()
            .map(|param| (param, true));
        for (param, is_predicate) in declared.chain(predicates) {
            if param.is_immediate() {
                continue;
            }
            let full_name = param.full_name();
            if let Some(producer) = param.producer() {
                lift_produced(io, ancestry, producer, &group.name, &full_name, is_predicate)?;
            } else if !is_predicate {
                for entity in ancestry.ancestors(&group.name)? {
                    io.add_input(entity, &full_name, None);
                }
            }
        }
    }
    for &child in &group.groups {
        lift_recursive_groups(pipeline, ancestry, guarded, child, io)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions;
    use crate::types::{Condition, ConditionOperator, Group, GroupKind, Op, Operand};

    fn analyze(pipeline: &Pipeline) -> GroupIo {
        let ancestry = Ancestry::build(pipeline);
        let guarded = conditions::condition_params(pipeline);
        lift_io(pipeline, &ancestry, &guarded).unwrap()
    }

    fn entry(name: &str, marker: Option<&str>) -> LiftedParam {
        (name.to_string(), marker.map(str::to_string))
    }

    #[test]
    fn cross_scope_consumption_lifts_through_the_ancestors() {
        // producer at root, consumer two groups deep.
        let mut pipeline = Pipeline::new("demo");
        let mut producer = Op::container("producer", "img");
        producer.declare_output("x");
        pipeline.add_op(pipeline.root, producer);
        let outer = pipeline.add_group(pipeline.root, Group::new("outer", GroupKind::Loop));
        let inner = pipeline.add_group(outer, Group::new("inner", GroupKind::Loop));
        let mut consumer = Op::container("consumer", "img");
        consumer.inputs.push(Param::output("producer", "x"));
        pipeline.add_op(inner, consumer);

        let io = analyze(&pipeline);
        assert_eq!(
            io.inputs["outer"],
            BTreeSet::from([entry("producer-x", Some("producer"))])
        );
        assert_eq!(io.inputs["inner"], BTreeSet::from([entry("producer-x", None)]));
        assert_eq!(
            io.inputs["consumer"],
            BTreeSet::from([entry("producer-x", None)])
        );
        assert_eq!(
            io.outputs["producer"],
            BTreeSet::from([entry("producer-x", None)])
        );
        assert!(!io.inputs.contains_key("demo"));
    }

    #[test]
    fn producer_side_outputs_chain_through_child_groups() {
        // producer two groups deep, consumer at root.
        let mut pipeline = Pipeline::new("demo");
        let outer = pipeline.add_group(pipeline.root, Group::new("outer", GroupKind::Loop));
        let inner = pipeline.add_group(outer, Group::new("inner", GroupKind::Loop));
        let mut producer = Op::container("producer", "img");
        producer.declare_output("x");
        pipeline.add_op(inner, producer);
        let mut consumer = Op::container("consumer", "img");
        consumer.inputs.push(Param::output("producer", "x"));
        pipeline.add_op(pipeline.root, consumer);

        let io = analyze(&pipeline);
        assert_eq!(
            io.outputs["outer"],
            BTreeSet::from([entry("producer-x", Some("inner"))])
        );
        assert_eq!(
            io.outputs["inner"],
            BTreeSet::from([entry("producer-x", Some("producer"))])
        );
        assert_eq!(
            io.outputs["producer"],
            BTreeSet::from([entry("producer-x", None)])
        );
        assert_eq!(
            io.inputs["consumer"],
            BTreeSet::from([entry("producer-x", Some("outer"))])
        );
    }

    #[test]
    fn pipeline_inputs_thread_down_every_group() {
        let mut pipeline = Pipeline::new("demo");
        let outer = pipeline.add_group(pipeline.root, Group::new("outer", GroupKind::Loop));
        let mut op = Op::container("leaf", "img");
        op.inputs.push(Param::pipeline_input("rate"));
        pipeline.add_op(outer, op);

        let io = analyze(&pipeline);
        for entity in ["demo", "outer", "leaf"] {
            assert_eq!(io.inputs[entity], BTreeSet::from([entry("rate", None)]));
        }
    }

    #[test]
    fn immediate_parameters_are_not_surfaced() {
        let mut pipeline = Pipeline::new("demo");
        let mut op = Op::container("leaf", "img");
        op.inputs.push(Param::immediate("threshold", "0.5"));
        pipeline.add_op(pipeline.root, op);

        let io = analyze(&pipeline);
        assert!(io.inputs.is_empty());
        assert!(io.outputs.is_empty());
    }

    #[test]
    fn exit_handler_ops_do_not_thread_pipeline_inputs() {
        let mut pipeline = Pipeline::new("demo");
        let mut op = Op::container("cleanup", "img");
        op.is_exit_handler = true;
        op.inputs.push(Param::pipeline_input("rate"));
        pipeline.add_detached_op(op);

        let io = analyze(&pipeline);
        assert!(io.inputs.is_empty());
    }

    #[test]
    fn recursive_group_predicates_skip_the_deepest_input() {
        // entry group guarded by a condition on a produced parameter; the
        // recursive re-entry must thread it down to, but not into, itself.
        let mut pipeline = Pipeline::new("demo");
        let mut producer = Op::container("producer", "img");
        producer.declare_output("flag");
        pipeline.add_op(pipeline.root, producer);
        let cond = GroupKind::Condition(Condition {
            operand1: Operand::Param(Param::output("producer", "flag")),
            operator: ConditionOperator::Eq,
            operand2: Operand::Literal("go".to_string()),
        });
        let entry_id = pipeline.add_group(pipeline.root, Group::new("entry", cond));
        pipeline.add_group(
            entry_id,
            Group::new("again", GroupKind::Recursive { target: entry_id }),
        );

        let io = analyze(&pipeline);
        assert_eq!(
            io.inputs["entry"],
            BTreeSet::from([entry("producer-flag", Some("producer"))])
        );
        assert!(!io.inputs.contains_key("again"));
    }
}
