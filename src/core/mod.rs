//! Core effect and lifecycle types.
//!
//! Nothing in this module spawns fibers or touches the registry:
//! - Effects via the `Effect` trait, and their erased `Performed` form
//! - Lifecycle statuses via the `Status` trait
//! - Status histories recorded by running scopes
//! - Identifiers for scopes and handler invocations

mod effect;
mod history;
mod ids;
mod status;

pub use effect::{Effect, Performed};
pub use history::{StatusHistory, StatusTransition};
pub use ids::{HandlerId, ScopeId};
pub use status::Status;

pub(crate) use effect::{downcast_value, Value};
