//! Compilation errors.

use thiserror::Error;

/// Any error raised while compiling a pipeline into a workflow manifest.
///
/// All errors abort compilation; none are recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// An ancestor lookup named an entity that is neither an op nor a group.
    #[error("no op or group named `{0}` exists in the pipeline")]
    UnknownEntity(String),
    /// A declared dependency resolves to neither an op nor a group.
    #[error("cannot find dependency `{0}` among the pipeline's ops and groups")]
    UnknownDependency(String),
    /// More than one exit handler, or an exit handler that does not cover
    /// all of the pipeline's ops.
    #[error("only one exit handler is allowed and it must cover all of the pipeline's ops")]
    MultipleExitHandlers,
}
