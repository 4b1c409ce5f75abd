//! Workflow assembly: normalization, validation, and the outer manifest.

use crate::error::CompileError;
use crate::op_template::{DefaultRender, RenderOp};
use crate::types::manifest::{
    Arguments, LocalObjectReference, Metadata, Parameter, Volume, Workflow, WorkflowSpec,
};
use crate::types::pipeline::OpTransformer;
use crate::types::{GroupId, GroupKind, Pipeline};
use crate::typecheck::TypeCheckScope;
use crate::{sanitize, template, transform};
use std::collections::BTreeSet;

/// Service account every compiled workflow runs as.
pub const SERVICE_ACCOUNT: &str = "pipeline-runner";

/// Compile a pipeline into a workflow manifest with the built-in op
/// renderer and type checking enabled.
pub fn compile(pipeline: &Pipeline) -> Result<Workflow, CompileError> {
    compile_with(pipeline, &DefaultRender, true)
}

/// Compile a pipeline into a workflow manifest.
///
/// The caller's pipeline is cloned and never mutated. The clone is
/// validated, sanitized, and normalized (artifact-location inheritance and
/// op transformers), then the analyses run once over the tree and the outer
/// manifest is assembled. The type-check flag is set to `type_check` for the
/// duration of the call and restored afterwards, error or not.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, fields(pipeline = %pipeline.name), err)
)]
pub fn compile_with<H: RenderOp>(
    pipeline: &Pipeline,
    handler: &H,
    type_check: bool,
) -> Result<Workflow, CompileError> {
    let _scope = TypeCheckScope::set(type_check);
    let mut pipeline = pipeline.clone();
    validate_exit_handlers(&pipeline)?;
    sanitize::sanitize_pipeline(&mut pipeline);
    normalize_ops(&mut pipeline);
    create_workflow(&pipeline, handler)
}

/// Assemble the outer manifest from a normalized pipeline.
pub fn create_workflow<H: RenderOp>(
    pipeline: &Pipeline,
    handler: &H,
) -> Result<Workflow, CompileError> {
    let mut templates = template::create_templates(pipeline, handler)?;
    templates.sort_by(|a, b| a.name.cmp(&b.name));

    let parameters = pipeline
        .args
        .iter()
        .map(|arg| Parameter {
            name: arg.name.clone(),
            value: arg.default.clone(),
        })
        .collect();

    Ok(Workflow {
        api_version: Workflow::API_VERSION.to_string(),
        kind: Workflow::KIND.to_string(),
        metadata: Metadata {
            generate_name: format!("{}-", pipeline.name),
        },
        spec: WorkflowSpec {
            entrypoint: pipeline.name.clone(),
            templates,
            arguments: Arguments { parameters },
            service_account_name: SERVICE_ACCOUNT.to_string(),
            image_pull_secrets: pipeline
                .conf
                .image_pull_secrets
                .iter()
                .map(|name| LocalObjectReference { name: name.clone() })
                .collect(),
            active_deadline_seconds: pipeline.conf.timeout_seconds,
            on_exit: exit_handler_op(pipeline),
            volumes: collect_volumes(pipeline),
        },
    })
}

/// Inherit the pipeline-level artifact location and apply the op
/// transformers, built-ins first.
fn normalize_ops(pipeline: &mut Pipeline) {
    let artifact_location = pipeline.conf.artifact_location.clone();
    let transformers: Vec<OpTransformer> = std::iter::once(transform::add_pod_name_env as OpTransformer)
        .chain(pipeline.conf.op_transformers.iter().copied())
        .collect();
    for op in pipeline.ops.values_mut() {
        if op.artifact_location.is_none() {
            op.artifact_location = artifact_location.clone();
        }
        for transformer in &transformers {
            transformer(op);
        }
    }
}

/// The exit op of the root's exit handler, if one is present.
fn exit_handler_op(pipeline: &Pipeline) -> Option<String> {
    let &first = pipeline.root_group().groups.first()?;
    match &pipeline.group(first).kind {
        GroupKind::ExitHandler { exit_op } => Some(exit_op.clone()),
        _ => None,
    }
}

/// The union of all ops' volumes, deduplicated by name and sorted.
fn collect_volumes(pipeline: &Pipeline) -> Vec<Volume> {
    let mut seen = BTreeSet::new();
    let mut volumes: Vec<Volume> = pipeline
        .ops
        .values()
        .flat_map(|op| op.volumes.iter())
        .filter(|volume| seen.insert(volume.name.clone()))
        .cloned()
        .collect();
    volumes.sort_by(|a, b| a.name.cmp(&b.name));
    volumes
}

/// Reject pipelines with more than one exit handler, or with an exit
/// handler that does not cover all ops.
///
/// An op counts as covered when it lives inside the handler's subtree or is
/// itself an exit target.
fn validate_exit_handlers(pipeline: &Pipeline) -> Result<(), CompileError> {
    let mut handlers = Vec::new();
    collect_handlers(pipeline, pipeline.root, &mut handlers);
    if handlers.len() > 1 {
        return Err(CompileError::MultipleExitHandlers);
    }
    if let Some(&handler) = handlers.first() {
        let mut covered = BTreeSet::new();
        collect_ops(pipeline, handler, &mut covered);
        for (name, op) in &pipeline.ops {
            if !op.is_exit_handler && !covered.contains(name) {
                return Err(CompileError::MultipleExitHandlers);
            }
        }
    }
    Ok(())
}

fn collect_handlers(pipeline: &Pipeline, id: GroupId, handlers: &mut Vec<GroupId>) {
    let group = pipeline.group(id);
    if group.is_recursive() {
        return;
    }
    if matches!(group.kind, GroupKind::ExitHandler { .. }) {
        handlers.push(id);
    }
    for &child in &group.groups {
        collect_handlers(pipeline, child, handlers);
    }
}

fn collect_ops(pipeline: &Pipeline, id: GroupId, ops: &mut BTreeSet<String>) {
    let group = pipeline.group(id);
    if group.is_recursive() {
        return;
    }
    ops.extend(group.ops.iter().cloned());
    for &child in &group.groups {
        collect_ops(pipeline, child, ops);
    }
}
