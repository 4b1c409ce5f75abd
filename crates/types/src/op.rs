//! # Operations
//! Leaf actions of the pipeline tree.

use crate::manifest::{EnvVar, Volume};
use crate::param::Param;
use crate::pipeline::ArtifactLocation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single containerized action at a leaf of the pipeline tree.
///
/// The fields common to all op variants form the op's capability surface:
/// inputs, outputs, explicit dependencies, volumes, and the exit-handler
/// flag. Variant-only state lives on [`OpVariant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    /// Unique name of the op across the whole pipeline.
    pub name: String,
    /// Ordered input parameters consumed by the op.
    pub inputs: Vec<Param>,
    /// Output parameters keyed by output name.
    pub outputs: BTreeMap<String, Param>,
    /// Names of ops or groups this op must run after, beyond what its
    /// parameters already imply.
    pub dependent_names: Vec<String>,
    /// Whether this op is a workflow exit target rather than a DAG task.
    pub is_exit_handler: bool,
    /// Volumes the op mounts. Deduplicated by name at the workflow level.
    pub volumes: Vec<Volume>,
    /// Where the op's output artifacts are stored. Ops without their own
    /// location inherit the pipeline-level one during normalization.
    pub artifact_location: Option<ArtifactLocation>,
    /// Variant-specific state.
    pub variant: OpVariant,
}

impl Op {
    /// A new container op running the given image.
    pub fn container(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self::new(
            name,
            OpVariant::Container(ContainerSpec {
                image: image.into(),
                command: Vec::new(),
                args: Vec::new(),
                env: Vec::new(),
                file_outputs: BTreeMap::new(),
            }),
        )
    }

    /// A new resource op applying the given manifest.
    pub fn resource(
        name: impl Into<String>,
        action: impl Into<String>,
        manifest: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            OpVariant::Resource(ResourceSpec {
                action: action.into(),
                manifest: manifest.into(),
                attribute_outputs: BTreeMap::new(),
            }),
        )
    }

    fn new(name: impl Into<String>, variant: OpVariant) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: BTreeMap::new(),
            dependent_names: Vec::new(),
            is_exit_handler: false,
            volumes: Vec::new(),
            artifact_location: None,
            variant,
        }
    }

    /// Declare an output of this op, making it referenceable downstream.
    pub fn declare_output(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.outputs
            .insert(name.clone(), Param::output(self.name.clone(), name));
    }
}

/// Variant-specific op state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpVariant {
    /// An op that runs a container.
    Container(ContainerSpec),
    /// An op that applies a cluster resource manifest.
    Resource(ResourceSpec),
}

/// State specific to container ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container image to run.
    pub image: String,
    /// Entrypoint override.
    pub command: Vec<String>,
    /// Arguments to the entrypoint.
    pub args: Vec<String>,
    /// Environment variables.
    pub env: Vec<EnvVar>,
    /// Output name to in-container file path. Each entry becomes an output
    /// parameter read from that path.
    pub file_outputs: BTreeMap<String, String>,
}

/// State specific to resource ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Action to perform on the resource (`create`, `apply`, ...).
    pub action: String,
    /// The resource manifest text.
    pub manifest: String,
    /// Output name to JSON path into the applied resource. Each entry becomes
    /// an output parameter read from that path.
    pub attribute_outputs: BTreeMap<String, String>,
}
