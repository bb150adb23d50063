//! Scope execution: fibers, handler invocations, the scope registry and the
//! orchestration loop.

pub mod config;
pub mod context;
pub mod error;
mod fiber;
pub mod handler;
pub mod registry;
pub mod report;
pub mod scope;

pub use config::FiberConfig;
pub use context::Context;
pub use error::EffectError;
pub use handler::{unhandled, Handler, HandlerStatus};
pub use registry::Registry;
pub use report::ScopeReport;
pub use scope::{Scope, ScopeStatus};
