//! Cluster-safe identifier normalization.

use crate::types::{GroupKind, Op, OpVariant, Param, ParamKind, Pipeline};
use std::collections::BTreeMap;

/// Normalize a name for the target cluster.
///
/// Lowercases, maps every run of characters outside `[a-z0-9-]` to a single
/// `-`, collapses runs of `-`, and trims leading and trailing `-`. The
/// function is idempotent, so already-sanitized names pass through
/// unchanged.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if mapped == '-' && out.ends_with('-') {
            continue;
        }
        out.push(mapped);
    }
    out.trim_matches('-').to_string()
}

/// Sanitize every identifier of a pipeline in place.
///
/// Covers the pipeline name (and the root group, which carries it), pipeline
/// argument names, op names (re-keying the op map), every parameter name and
/// producer reference, dependency names, exit-op references, and file- and
/// attribute-output keys. Group names are not rewritten: the tree builder
/// generates them. The same sanitized names therefore appear everywhere in
/// the emitted manifest.
pub fn sanitize_pipeline(pipeline: &mut Pipeline) {
    pipeline.name = sanitize_name(&pipeline.name);
    let root = pipeline.root;
    pipeline.groups[root].name = pipeline.name.clone();

    for arg in &mut pipeline.args {
        arg.name = sanitize_name(&arg.name);
    }

    let ops = std::mem::take(&mut pipeline.ops);
    pipeline.ops = ops
        .into_values()
        .map(|mut op| {
            sanitize_op(&mut op);
            (op.name.clone(), op)
        })
        .collect();
    for group in &mut pipeline.groups {
        for op in &mut group.ops {
            *op = sanitize_name(op);
        }
        for param in &mut group.inputs {
            sanitize_param(param);
        }
        for dependency in &mut group.dependencies {
            *dependency = sanitize_name(dependency);
        }
        match &mut group.kind {
            GroupKind::Condition(condition) => {
                for operand in [&mut condition.operand1, &mut condition.operand2] {
                    if let crate::types::Operand::Param(param) = operand {
                        sanitize_param(param);
                    }
                }
            }
            GroupKind::ExitHandler { exit_op } => *exit_op = sanitize_name(exit_op),
            _ => {}
        }
    }
}

fn sanitize_op(op: &mut Op) {
    op.name = sanitize_name(&op.name);
    for param in &mut op.inputs {
        sanitize_param(param);
    }
    let outputs = std::mem::take(&mut op.outputs);
    op.outputs = outputs
        .into_iter()
        .map(|(name, mut param)| {
            sanitize_param(&mut param);
            (sanitize_name(&name), param)
        })
        .collect();
    for name in &mut op.dependent_names {
        *name = sanitize_name(name);
    }
    match &mut op.variant {
        OpVariant::Container(spec) => {
            spec.file_outputs = sanitize_keys(std::mem::take(&mut spec.file_outputs));
        }
        OpVariant::Resource(spec) => {
            spec.attribute_outputs = sanitize_keys(std::mem::take(&mut spec.attribute_outputs));
        }
    }
}

fn sanitize_param(param: &mut Param) {
    param.name = sanitize_name(&param.name);
    if let ParamKind::Ref {
        producer: Some(producer),
    } = &mut param.kind
    {
        *producer = sanitize_name(producer);
    }
}

fn sanitize_keys(map: BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(key, value)| (sanitize_name(&key), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Group, GroupKind};

    #[test]
    fn names_are_lowercased_and_dashed() {
        assert_eq!(sanitize_name("Train Model"), "train-model");
        assert_eq!(sanitize_name("My_Op (v2)"), "my-op-v2");
        assert_eq!(sanitize_name("--edge--"), "edge");
    }

    #[test]
    fn sanitization_is_idempotent() {
        for name in ["Train Model", "My_Op (v2)", "already-clean", "A  B"] {
            let once = sanitize_name(name);
            assert_eq!(sanitize_name(&once), once);
        }
    }

    #[test]
    fn pipeline_identifiers_are_rewritten_consistently() {
        let mut pipeline = Pipeline::new("My Pipeline");
        let mut producer = Op::container("Producer Op", "img");
        producer
            .outputs
            .insert("Out X".to_string(), Param::output("Producer Op", "Out X"));
        pipeline.add_op(pipeline.root, producer);
        let mut consumer = Op::container("Consumer Op", "img");
        consumer.inputs.push(Param::output("Producer Op", "Out X"));
        consumer.dependent_names.push("Producer Op".to_string());
        pipeline.add_op(pipeline.root, consumer);
        let mut stage = Group::new("stage", GroupKind::Loop);
        stage.dependencies.push("Producer Op".to_string());
        pipeline.add_group(pipeline.root, stage);

        sanitize_pipeline(&mut pipeline);
        assert_eq!(pipeline.name, "my-pipeline");
        assert_eq!(pipeline.root_group().name, "my-pipeline");
        let consumer = &pipeline.ops["consumer-op"];
        assert_eq!(consumer.inputs[0].full_name(), "producer-op-out-x");
        assert_eq!(consumer.dependent_names, ["producer-op"]);
        let producer = &pipeline.ops["producer-op"];
        assert_eq!(producer.outputs["out-x"].full_name(), "producer-op-out-x");
        assert_eq!(pipeline.groups[1].dependencies, ["producer-op"]);
        assert_eq!(pipeline.root_group().ops, ["producer-op", "consumer-op"]);
    }
}
