//! Runtime error types.

use crate::builder::BuildError;
use crate::core::ScopeId;
use thiserror::Error;

/// Errors surfaced by scopes, handlers and computations.
#[derive(Debug, Error, PartialEq)]
pub enum EffectError {
    /// A forwarded effect reached the outermost scope without being handled.
    #[error("effect `{effect}` reached the top scope without being handled")]
    UnhandledEffect { effect: &'static str },

    /// Marker returned by a handler that declines the effect it was given.
    #[error("handler declined the effect")]
    Unhandled,

    /// A handler tried to resume its continuation a second time.
    #[error("continuation already resumed: continuations are one-shot")]
    AlreadyResumed,

    /// A scope was started while already registered as active.
    #[error("{0} is already an active scope")]
    ReentrantScope(ScopeId),

    #[error("effect `{effect}` expects a `{expected}` but was resumed with a `{found}`")]
    ResumeTypeMismatch {
        effect: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("result is not a `{expected}`; forwarded handlers must share the scope's result type")]
    ResultTypeMismatch { expected: &'static str },

    #[error("handler declined its effect after resuming the computation")]
    UnhandledAfterResume,

    #[error("{fiber} panicked: {message}")]
    Panicked { fiber: String, message: String },

    /// A body awaited a future the runtime does not drive. Computations
    /// and handlers may only wait on `perform`, `resume` and other runtime
    /// calls.
    #[error("{fiber} is waiting on a future the effect runtime cannot drive")]
    Stalled { fiber: String },

    /// More handlers were parked after resuming than the scope allows.
    #[error("more than {limit} handlers parked in {scope}")]
    ParkedLimit { scope: ScopeId, limit: usize },

    #[error("runtime invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    /// Failure raised by user code in a computation or handler body.
    #[error("{0}")]
    Failed(String),
}

impl EffectError {
    /// Build a user-level failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Check whether this is the decline marker produced by `unhandled()`.
    pub fn is_unhandled_marker(&self) -> bool {
        matches!(self, Self::Unhandled)
    }
}
