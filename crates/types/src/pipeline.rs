//! # Pipelines
//! The root object consumed by the compiler.

use crate::group::{Group, GroupKind};
use crate::op::Op;
use crate::GroupId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fully built pipeline: a group tree plus a flat op lookup.
///
/// Pipelines are constructed externally (typically by an embedded DSL) and
/// passed to the compiler fully formed. The compiler never mutates the
/// caller's value; it clones and normalizes its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// The pipeline's name. Sanitized before analysis; the sanitized name is
    /// the workflow entrypoint.
    pub name: String,
    /// Arena of all groups in the tree. Children reference each other by
    /// index, so recursion back-edges do not make the structure cyclic.
    pub groups: Vec<Group>,
    /// Index of the root group within the arena.
    pub root: GroupId,
    /// All ops keyed by name.
    pub ops: BTreeMap<String, Op>,
    /// Pipeline-level input parameters.
    pub args: Vec<PipelineArg>,
    /// Compilation configuration.
    pub conf: PipelineConf,
}

impl Pipeline {
    /// A new pipeline whose root group carries the pipeline's name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            groups: vec![Group::new(name.clone(), GroupKind::Root)],
            root: 0,
            name,
            ops: BTreeMap::new(),
            args: Vec::new(),
            conf: PipelineConf::default(),
        }
    }

    /// The group at the given arena index.
    ///
    /// Panics when the index is out of bounds; indices handed out by
    /// [`add_group`][Self::add_group] are always valid.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id]
    }

    /// The root group.
    pub fn root_group(&self) -> &Group {
        &self.groups[self.root]
    }

    /// Intern a group into the arena as a child of `parent`, returning its id.
    pub fn add_group(&mut self, parent: GroupId, group: Group) -> GroupId {
        let id = self.groups.len();
        self.groups.push(group);
        self.groups[parent].groups.push(id);
        id
    }

    /// Register an op as a child of the given group.
    pub fn add_op(&mut self, parent: GroupId, op: Op) {
        self.groups[parent].ops.push(op.name.clone());
        self.ops.insert(op.name.clone(), op);
    }

    /// Register an op reachable only through the workflow's exit hook, not as
    /// a task of any group.
    pub fn add_detached_op(&mut self, op: Op) {
        self.ops.insert(op.name.clone(), op);
    }
}

/// A pipeline-level input parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineArg {
    /// Parameter name.
    pub name: String,
    /// Default value, surfaced in the workflow's arguments when present.
    pub default: Option<String>,
}

/// Compilation configuration attached to a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConf {
    /// Names of image pull secrets to attach to the workflow.
    pub image_pull_secrets: Vec<String>,
    /// Workflow deadline in seconds.
    pub timeout_seconds: Option<u64>,
    /// Default artifact location inherited by ops without their own.
    pub artifact_location: Option<ArtifactLocation>,
    /// Transformers applied to every op before analysis, in order, after the
    /// compiler's built-in ones. Transformers may mutate op state but must
    /// not alter the group tree.
    #[serde(skip)]
    pub op_transformers: Vec<OpTransformer>,
}

/// A function rewriting an op before analysis.
pub type OpTransformer = fn(&mut Op);

/// Where op output artifacts are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    /// Object store bucket.
    pub bucket: String,
    /// Key prefix within the bucket.
    pub key_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_group_wires_parent_and_child() {
        let mut pipeline = Pipeline::new("demo");
        let id = pipeline.add_group(pipeline.root, Group::new("stage", GroupKind::Loop));
        assert_eq!(pipeline.root_group().groups, vec![id]);
        assert_eq!(pipeline.group(id).name, "stage");
    }

    #[test]
    fn root_group_carries_pipeline_name() {
        let pipeline = Pipeline::new("demo");
        assert_eq!(pipeline.root_group().name, "demo");
    }
}
