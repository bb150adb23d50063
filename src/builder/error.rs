//! Build errors for scope builders.

use thiserror::Error;

/// Errors that can occur when building a scope.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("Computation not specified. Call .computation(body) before .build()")]
    MissingComputation,

    #[error("Handler not specified. Call .handler(fn) or .default_handler()")]
    MissingHandler,
}
