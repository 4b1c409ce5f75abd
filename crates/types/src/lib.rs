#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! # Common types for the hoist pipeline compiler.

#[doc(inline)]
pub use group::{Condition, ConditionOperator, Group, GroupKind, Operand};
#[doc(inline)]
pub use manifest::{Template, Workflow};
#[doc(inline)]
pub use op::{Op, OpVariant};
#[doc(inline)]
pub use param::{Param, ParamKind};
#[doc(inline)]
pub use pipeline::{Pipeline, PipelineArg, PipelineConf};

pub mod group;
pub mod manifest;
pub mod op;
pub mod param;
pub mod pipeline;

/// Index of a group within a pipeline's group arena.
///
/// Recursion back-edges are stored as arena indices rather than references,
/// keeping the tree itself acyclic. A recursion target is only ever named,
/// never traversed.
pub type GroupId = usize;
