//! # Parameters
//! Symbolic references that wire pipeline entities together.

use serde::{Deserialize, Serialize};

/// A symbolic parameter reference.
///
/// Parameters are immutable structural references; they never carry runtime
/// values. A parameter either names a value that flows through the pipeline
/// (a pipeline input or the output of a producing op) or holds an immediate
/// value known at compile time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Param {
    /// The parameter's own name, unique within its producer's outputs.
    pub name: String,
    /// What the parameter stands for.
    pub kind: ParamKind,
}

/// The two shapes a parameter can take.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// A literal value known at compile time.
    ///
    /// Immediate parameters are never surfaced as group inputs or outputs.
    Immediate(String),
    /// A reference to a value produced elsewhere in the pipeline.
    Ref {
        /// Name of the producing op, or `None` for a pipeline-level input.
        producer: Option<String>,
    },
}

impl Param {
    /// A reference to a pipeline-level input parameter.
    pub fn pipeline_input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Ref { producer: None },
        }
    }

    /// A reference to the output `name` of the op `producer`.
    pub fn output(producer: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Ref {
                producer: Some(producer.into()),
            },
        }
    }

    /// A parameter carrying an immediate value.
    pub fn immediate(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Immediate(value.into()),
        }
    }

    /// The globally unique name of the parameter: `producer '-' name` when a
    /// producer is present, otherwise the bare name.
    pub fn full_name(&self) -> String {
        match self.producer() {
            Some(producer) => format!("{}-{}", producer, self.name),
            None => self.name.clone(),
        }
    }

    /// The name of the producing op, if any.
    pub fn producer(&self) -> Option<&str> {
        match &self.kind {
            ParamKind::Ref {
                producer: Some(producer),
            } => Some(producer),
            _ => None,
        }
    }

    /// Whether the parameter holds an immediate value.
    pub fn is_immediate(&self) -> bool {
        matches!(self.kind, ParamKind::Immediate(_))
    }
}
