//! Effectful: one-shot algebraic effect handlers
//!
//! A computation performs typed effects; the handler function of the
//! innermost enclosing scope decides what each one means. A handler can
//! resume the computation once with a value, abort it by returning its own
//! result, or decline and let the next enclosing scope try.
//!
//! Computations and handler functions are async closures. `perform` and
//! `resume` are their suspension points; the scope polls them itself, so no
//! executor is needed and a handler parked after `resume` costs only its
//! suspended future.
//!
//! # Core Concepts
//!
//! - **Effect**: a typed request declared with the `Effect` trait or `effect!`
//! - **Scope**: one computation bound to one handler function
//! - **Handler**: control over one performed effect: `resume` or `unhandled`
//! - **Registry**: the stack of running scopes that forwarding walks
//!
//! # Example
//!
//! ```rust
//! use effectful::{effect, run};
//!
//! effect! {
//!     /// Ask for the next line of input.
//!     pub struct Read -> String;
//! }
//!
//! let result = run(
//!     async |cx| {
//!         let first = cx.perform(Read).await?;
//!         let second = cx.perform(Read).await?;
//!         Ok(format!("{first} {second}"))
//!     },
//!     async |_, handler| handler.resume("line".to_string()).await,
//! );
//!
//! assert_eq!(result.unwrap(), "line line");
//! ```

#[macro_use]
mod macros;

pub mod builder;
pub mod core;
pub mod runtime;
pub mod shell;

// Re-export commonly used types
pub use builder::{handle, handle_with_default, run, BuildError, ScopeBuilder};
pub use core::{Effect, HandlerId, Performed, ScopeId, Status, StatusHistory};
pub use runtime::{
    unhandled, Context, EffectError, FiberConfig, Handler, HandlerStatus, Registry, Scope,
    ScopeReport, ScopeStatus,
};
