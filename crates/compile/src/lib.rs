//! Core logic for compiling a [`Pipeline`][types::Pipeline] into an Argo
//! `Workflow` manifest.
//!
//! Typical usage is a single call to [`compile`], which clones the caller's
//! pipeline, normalizes it, and runs the full analysis stack. The individual
//! analyses are public for callers that need finer control:
//!
//! - [`scope::Ancestry`] computes per-entity ancestor chains and resolves
//!   the divergent tails of any two entities.
//! - [`conditions::condition_params`] collects the predicate parameters in
//!   force at each op and recursive group.
//! - [`lift::lift_io`] decides which group or op exposes which parameter as
//!   an input or output.
//! - [`deps::lift_dependencies`] lifts happens-before edges to the lowest
//!   common scope, so every edge connects siblings.
//! - [`resolve`] renders parameter references against a group's inputs.
//! - [`template::create_templates`] synthesizes one DAG template per group
//!   and delegates leaf ops to a [`RenderOp`] implementation.
//! - [`workflow::create_workflow`] assembles the outer manifest.

#![deny(missing_docs)]
#![deny(unsafe_code)]

#[doc(inline)]
pub use hoist_types as types;

pub mod conditions;
pub mod deps;
pub mod error;
pub mod lift;
pub mod op_template;
pub mod resolve;
pub mod sanitize;
pub mod scope;
pub mod template;
pub mod transform;
pub mod typecheck;
pub mod workflow;

pub use error::CompileError;
pub use op_template::{DefaultRender, RenderOp};
pub use workflow::{compile, compile_with};
