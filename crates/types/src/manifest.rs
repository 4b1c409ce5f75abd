//! # Workflow manifest
//! Typed model of the emitted Argo Workflow `v1alpha1` manifest.
//!
//! Serialization is deterministic by construction: struct fields serialize in
//! declaration order and every collection is sorted by name before emission,
//! so equal inputs always yield byte-identical YAML.

use serde::{Deserialize, Serialize};

/// The top-level workflow manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Always [`Workflow::API_VERSION`].
    pub api_version: String,
    /// Always [`Workflow::KIND`].
    pub kind: String,
    /// Workflow metadata.
    pub metadata: Metadata,
    /// The workflow spec.
    pub spec: WorkflowSpec,
}

impl Workflow {
    /// The manifest API version.
    pub const API_VERSION: &'static str = "argoproj.io/v1alpha1";
    /// The manifest kind.
    pub const KIND: &'static str = "Workflow";
}

/// Workflow metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Prefix from which the cluster generates the concrete workflow name.
    pub generate_name: String,
}

/// The `spec` section of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    /// Name of the template to run first.
    pub entrypoint: String,
    /// All templates, sorted by name.
    pub templates: Vec<Template>,
    /// Workflow-level arguments.
    pub arguments: Arguments,
    /// Service account the workflow runs as.
    pub service_account_name: String,
    /// Secrets for pulling container images.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub image_pull_secrets: Vec<LocalObjectReference>,
    /// Workflow deadline in seconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub active_deadline_seconds: Option<u64>,
    /// Template invoked when the workflow exits.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub on_exit: Option<String>,
    /// Volumes available to the workflow's templates, sorted by name.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub volumes: Vec<Volume>,
}

/// One template of the workflow: a DAG for a group, or a leaf action for an op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template name.
    pub name: String,
    /// Input parameters, sorted by name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inputs: Option<Inputs>,
    /// Output parameters, sorted by name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub outputs: Option<Outputs>,
    /// The task graph, present on group templates.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dag: Option<Dag>,
    /// Container to run, present on container op templates.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub container: Option<Container>,
    /// Resource to apply, present on resource op templates.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource: Option<ResourceTemplate>,
}

impl Template {
    /// A new template with only its name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: None,
            outputs: None,
            dag: None,
            container: None,
            resource: None,
        }
    }
}

/// A template's input parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inputs {
    /// The parameters, sorted by name.
    pub parameters: Vec<Parameter>,
}

/// A template's output parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    /// The parameters, sorted by name.
    pub parameters: Vec<OutputParameter>,
}

/// A named parameter with an optional value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter value; a literal or a `{{...}}` reference.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
}

/// An output parameter and where its value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputParameter {
    /// Parameter name.
    pub name: String,
    /// The source of the value.
    pub value_from: ValueFrom,
}

/// The source of an output parameter's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFrom {
    /// A `{{tasks...}}` reference to a child task's output.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameter: Option<String>,
    /// An in-container file path.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
    /// A JSON path into an applied resource.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub json_path: Option<String>,
}

/// The task graph of a group template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dag {
    /// The tasks, sorted by name.
    pub tasks: Vec<DagTask>,
}

/// One task of a DAG template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DagTask {
    /// Task name.
    pub name: String,
    /// Name of the template the task runs.
    pub template: String,
    /// Predicate gating the task, for condition children.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub when: Option<String>,
    /// Names of sibling tasks this task runs after, sorted.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dependencies: Vec<String>,
    /// Arguments passed to the task's template.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub arguments: Option<Arguments>,
}

impl DagTask {
    /// A new task running the template of the same name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            template: name.clone(),
            name,
            when: None,
            dependencies: Vec::new(),
            arguments: None,
        }
    }
}

/// Arguments passed to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    /// The parameters, sorted by name.
    pub parameters: Vec<Parameter>,
}

/// The container section of a leaf template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container image.
    pub image: String,
    /// Entrypoint override.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub command: Vec<String>,
    /// Arguments to the entrypoint.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub args: Vec<String>,
    /// Environment variables.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub env: Vec<EnvVar>,
}

/// An environment variable of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Literal value.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    /// Value sourced from the cluster at run time.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value_from: Option<EnvVarSource>,
}

/// The source of an environment variable's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    /// A downward-API field reference.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field_ref: Option<FieldRef>,
}

/// A downward-API field reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    /// Path of the field, e.g. `metadata.name`.
    pub field_path: String,
}

/// The resource section of a leaf template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    /// Action to perform (`create`, `apply`, ...).
    pub action: String,
    /// The resource manifest text.
    pub manifest: String,
}

/// A reference to a named object in the workflow's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    /// The referenced object's name.
    pub name: String,
}

/// A volume mountable by the workflow's templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name, unique within the workflow.
    pub name: String,
    /// An ephemeral empty directory.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub empty_dir: Option<EmptyDirVolumeSource>,
    /// A secret-backed volume.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secret: Option<SecretVolumeSource>,
    /// A persistent-volume-claim-backed volume.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub persistent_volume_claim: Option<PersistentVolumeClaimVolumeSource>,
}

impl Volume {
    /// An ephemeral empty-directory volume.
    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            empty_dir: Some(EmptyDirVolumeSource {}),
            secret: None,
            persistent_volume_claim: None,
        }
    }

    /// A volume backed by the named secret.
    pub fn secret(name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            empty_dir: None,
            secret: Some(SecretVolumeSource {
                secret_name: secret_name.into(),
            }),
            persistent_volume_claim: None,
        }
    }
}

/// An empty-directory volume source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyDirVolumeSource {}

/// A secret volume source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVolumeSource {
    /// Name of the secret.
    pub secret_name: String,
}

/// A persistent-volume-claim volume source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimVolumeSource {
    /// Name of the claim.
    pub claim_name: String,
}
