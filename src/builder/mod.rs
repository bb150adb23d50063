//! Builder API for ergonomic scope construction.
//!
//! [`ScopeBuilder`] assembles a scope step by step; the free functions cover
//! the common shapes in one call. Scopes built here are top-level: each one
//! runs in a fresh registry. Use [`Context::handle`](crate::Context::handle)
//! and friends from inside a computation to nest.

pub mod error;
pub mod scope;

pub use error::BuildError;
pub use scope::ScopeBuilder;

use crate::core::Performed;
use crate::runtime::{Context, EffectError, Handler};
use std::ops::{AsyncFn, AsyncFnOnce};

/// Start building a scope around `computation`.
///
/// # Example
///
/// ```
/// use effectful::builder::handle;
/// use effectful::effect;
///
/// effect! {
///     pub struct Greeting -> String;
/// }
///
/// let result = handle(async |cx| cx.perform(Greeting).await)
///     .with(async |_, handler| handler.resume("hello".to_string()).await);
///
/// assert_eq!(result.unwrap(), "hello");
/// ```
pub fn handle<R, C>(computation: C) -> ScopeBuilder<R>
where
    R: Send + 'static,
    C: AsyncFnOnce(&mut Context) -> Result<R, EffectError> + 'static,
{
    ScopeBuilder::new().computation(computation)
}

/// Run `computation` handled by `handler`.
///
/// # Example
///
/// ```
/// use effectful::{effect, run};
///
/// effect! {
///     pub struct Fail -> ();
/// }
///
/// // A handler that returns without resuming aborts the computation.
/// let result: Result<i32, _> = run(
///     async |cx| {
///         cx.perform(Fail).await?;
///         Ok(1)
///     },
///     async |_, _| Ok(42),
/// );
///
/// assert_eq!(result.unwrap(), 42);
/// ```
pub fn run<R, C, H>(computation: C, handler: H) -> Result<R, EffectError>
where
    R: Send + 'static,
    C: AsyncFnOnce(&mut Context) -> Result<R, EffectError> + 'static,
    H: AsyncFn(&Performed, &mut Handler<R>) -> Result<R, EffectError> + Send + Sync + 'static,
{
    handle(computation).with(handler)
}

/// Run `computation` with a handler that forwards every effect.
///
/// At the top level there is nowhere to forward to, so any effect fails
/// with [`EffectError::UnhandledEffect`]; a computation that performs
/// nothing just returns its value.
pub fn handle_with_default<R, C>(computation: C) -> Result<R, EffectError>
where
    R: Send + 'static,
    C: AsyncFnOnce(&mut Context) -> Result<R, EffectError> + 'static,
{
    handle(computation).with_default()
}
