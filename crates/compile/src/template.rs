//! Synthesis of DAG templates from groups.

use crate::error::CompileError;
use crate::lift::{lift_io, GroupIo};
use crate::op_template::RenderOp;
use crate::resolve::{canonical_inputs, input_ref, resolve_operand, task_output_ref};
use crate::scope::Ancestry;
use crate::types::manifest::{
    Arguments, Dag, DagTask, Inputs, OutputParameter, Outputs, Parameter, Template, ValueFrom,
};
use crate::types::{Group, GroupKind, Pipeline};
use crate::{conditions, deps};
use std::collections::{BTreeMap, BTreeSet};

/// Dependencies keyed by entity name.
type Dependencies = BTreeMap<String, BTreeSet<String>>;

/// Synthesize every template of the pipeline: one DAG template per
/// non-recursive group, plus the renderer's templates for every op.
///
/// The pipeline is expected to be normalized (sanitized names, transformers
/// applied); [`workflow::compile`][crate::workflow::compile] takes care of
/// that.
pub fn create_templates<H: RenderOp + ?Sized>(
    pipeline: &Pipeline,
    handler: &H,
) -> Result<Vec<Template>, CompileError> {
    let ancestry = Ancestry::build(pipeline);
    let guarded = conditions::condition_params(pipeline);
    let io = lift_io(pipeline, &ancestry, &guarded)?;
    let dependencies = deps::lift_dependencies(pipeline, &ancestry, &guarded)?;

    let mut templates = Vec::new();
    for &id in ancestry.groups.values() {
        templates.push(group_template(pipeline, pipeline.group(id), &io, &dependencies));
    }
    for op in pipeline.ops.values() {
        templates.extend(handler.render(op)?);
    }
    #[cfg(feature = "tracing")]
    tracing::trace!(
        groups = ancestry.groups.len(),
        templates = templates.len(),
        "synthesized pipeline templates"
    );
    Ok(templates)
}

/// Synthesize the DAG template of a single non-recursive group.
pub fn group_template(
    pipeline: &Pipeline,
    group: &Group,
    io: &GroupIo,
    dependencies: &Dependencies,
) -> Template {
    let mut template = Template::new(group.name.clone());

    if let Some(lifted) = io.inputs.get(&group.name) {
        let parameters: Vec<Parameter> = canonical_inputs(lifted)
            .into_keys()
            .map(|name| Parameter { name, value: None })
            .collect();
        if !parameters.is_empty() {
            template.inputs = Some(Inputs { parameters });
        }
    }

    if let Some(lifted) = io.outputs.get(&group.name) {
        // Group outputs always name the child task carrying the value; a
        // bare `None` marker only ever lands on the producing op itself.
        let parameters: Vec<OutputParameter> = canonical_inputs(lifted)
            .into_iter()
            .filter_map(|(name, marker)| {
                let task = marker?;
                Some(OutputParameter {
                    value_from: ValueFrom {
                        parameter: Some(task_output_ref(&task, &name)),
                        ..ValueFrom::default()
                    },
                    name,
                })
            })
            .collect();
        if !parameters.is_empty() {
            template.outputs = Some(Outputs { parameters });
        }
    }

    let mut tasks = Vec::new();
    for &child in &group.groups {
        tasks.push(group_task(pipeline, pipeline.group(child), io, dependencies));
    }
    for op in &group.ops {
        tasks.push(op_task(op, io, dependencies));
    }
    tasks.sort_by(|a, b| a.name.cmp(&b.name));
    template.dag = Some(Dag { tasks });
    template
}

/// The DAG task invoking a child group's template.
fn group_task(
    pipeline: &Pipeline,
    child: &Group,
    io: &GroupIo,
    dependencies: &Dependencies,
) -> DagTask {
    // A recursive child runs its target's template under the target's name;
    // its own name keys the analyses.
    let target = child.recursion_target().map(|id| pipeline.group(id));
    let mut task = match target {
        Some(target) => DagTask::new(target.name.clone()),
        None => DagTask::new(child.name.clone()),
    };

    if let GroupKind::Condition(condition) = &child.kind {
        let inputs = io
            .inputs
            .get(&child.name)
            .map(canonical_inputs)
            .unwrap_or_default();
        task.when = Some(format!(
            "{} {} {}",
            resolve_operand(&condition.operand1, &inputs),
            condition.operator,
            resolve_operand(&condition.operand2, &inputs),
        ));
    }

    wire_task(&mut task, &child.name, io, dependencies, target.map(|t| (child, t)));
    task
}

/// The DAG task invoking a child op's template.
fn op_task(op: &str, io: &GroupIo, dependencies: &Dependencies) -> DagTask {
    let mut task = DagTask::new(op.to_string());
    wire_task(&mut task, op, io, dependencies, None);
    task
}

/// Fill in the dependencies and arguments of a task from the analyses.
///
/// `recursion` carries the recursive child together with its target: the
/// argument values resolve in the caller's scope, but the argument names are
/// mapped positionally onto the target's declared inputs so that the shared
/// template sees its own parameter names.
fn wire_task(
    task: &mut DagTask,
    entity: &str,
    io: &GroupIo,
    dependencies: &Dependencies,
    recursion: Option<(&Group, &Group)>,
) {
    if let Some(upstream) = dependencies.get(entity) {
        task.dependencies = upstream.iter().cloned().collect();
    }

    let Some(lifted) = io.inputs.get(entity) else {
        return;
    };
    let mut parameters: Vec<Parameter> = canonical_inputs(lifted)
        .into_iter()
        .map(|(full_name, marker)| {
            let value = match &marker {
                Some(sibling) => task_output_ref(sibling, &full_name),
                None => input_ref(&full_name),
            };
            let name = match recursion {
                Some((caller, target)) => recursive_argument_name(caller, target, &full_name),
                None => full_name,
            };
            Parameter {
                name,
                value: Some(value),
            }
        })
        .collect();
    parameters.sort_by(|a, b| a.name.cmp(&b.name));
    if !parameters.is_empty() {
        task.arguments = Some(Arguments { parameters });
    }
}

/// Map a caller-side argument name onto the recursion target's parameter at
/// the same declared-input position. A name with no positional match keeps
/// the caller-side form.
fn recursive_argument_name(caller: &Group, target: &Group, full_name: &str) -> String {
    caller
        .inputs
        .iter()
        .position(|param| param.full_name() == full_name)
        .and_then(|index| target.inputs.get(index))
        .map_or_else(|| full_name.to_string(), |param| param.full_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_template::DefaultRender;
    use crate::types::{Op, Param};

    #[test]
    fn tasks_and_templates_are_sorted_by_name() {
        let mut pipeline = Pipeline::new("demo");
        pipeline.add_op(pipeline.root, Op::container("zeta", "img"));
        pipeline.add_op(pipeline.root, Op::container("alpha", "img"));

        let templates = create_templates(&pipeline, &DefaultRender).unwrap();
        let root = templates.iter().find(|t| t.name == "demo").unwrap();
        let tasks: Vec<&str> = root
            .dag
            .as_ref()
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(tasks, ["alpha", "zeta"]);
    }

    #[test]
    fn recursive_arguments_carry_the_target_names() {
        let mut entry = Group::new("entry", GroupKind::Loop);
        entry.inputs.push(Param::pipeline_input("seed"));
        let mut pipeline = Pipeline::new("demo");
        let entry_id = pipeline.add_group(pipeline.root, entry);
        let mut body = Op::container("body", "img");
        body.inputs.push(Param::pipeline_input("seed"));
        body.declare_output("next");
        pipeline.add_op(entry_id, body);
        let mut again = Group::new("again", GroupKind::Recursive { target: entry_id });
        again.inputs.push(Param::output("body", "next"));
        pipeline.add_group(entry_id, again);
        pipeline
            .args
            .push(crate::types::PipelineArg {
                name: "seed".to_string(),
                default: None,
            });

        let templates = create_templates(&pipeline, &DefaultRender).unwrap();
        let entry_template = templates.iter().find(|t| t.name == "entry").unwrap();
        let recursion = entry_template
            .dag
            .as_ref()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.name == "entry")
            .unwrap();
        assert_eq!(recursion.template, "entry");
        let arguments = &recursion.arguments.as_ref().unwrap().parameters;
        assert_eq!(arguments.len(), 1);
        assert_eq!(arguments[0].name, "seed");
        assert_eq!(
            arguments[0].value.as_deref(),
            Some("{{tasks.body.outputs.parameters.body-next}}")
        );
    }
}
