//! Running scopes from stillwater effect pipelines.
//!
//! Scope execution is synchronous. [`scoped`] lifts it into a stillwater
//! [`Effect`] so an effect-handled computation can be built from the
//! pipeline's environment and composed with other stillwater effects.
//! The scope blocks the task that runs it until it finishes.

use crate::runtime::{EffectError, Scope};
use stillwater::effect::Effect;
use stillwater::prelude::*;

/// Build a scope from the environment and run it.
///
/// # Example
///
/// ```
/// use effectful::{effect, handle, shell::scoped};
/// use stillwater::effect::Effect;
///
/// effect! {
///     pub struct Limit -> usize;
/// }
///
/// #[derive(Clone)]
/// struct Env {
///     limit: usize,
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// let pipeline = scoped(|env: &Env| {
///     let limit = env.limit;
///     Ok(handle(async |cx| cx.perform(Limit).await)
///         .handler(async move |_, h| h.resume(limit).await)
///         .build()?)
/// });
///
/// assert_eq!(pipeline.run(&Env { limit: 3 }).await, Ok(3));
/// # }
/// ```
pub fn scoped<R, Env, F>(build: F) -> impl Effect<Output = R, Error = EffectError, Env = Env>
where
    R: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(&Env) -> Result<Scope<R>, EffectError> + Send + Sync + 'static,
{
    from_fn(move |env: &Env| build(env)?.run())
}
