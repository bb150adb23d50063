//! Builder for constructing scopes.

use crate::builder::error::BuildError;
use crate::core::Performed;
use crate::runtime::context::Context;
use crate::runtime::handler::{decline_all, erase_handler, ErasedHandlerFn, Handler};
use crate::runtime::scope::{ComputationFn, Parent};
use crate::runtime::{EffectError, FiberConfig, Scope};
use futures::future::FutureExt;
use std::ops::{AsyncFn, AsyncFnOnce};

/// Builder for a [`Scope`] with a fluent API.
///
/// ```rust
/// use effectful::{effect, ScopeBuilder};
///
/// effect! {
///     pub struct Answer -> u32;
/// }
///
/// let result = ScopeBuilder::new()
///     .computation(async |cx| Ok(cx.perform(Answer).await? + 1))
///     .with(async |_, handler| handler.resume(41_u32).await);
///
/// assert_eq!(result, Ok(42));
/// ```
pub struct ScopeBuilder<R> {
    computation: Option<ComputationFn<R>>,
    handler: Option<ErasedHandlerFn>,
    config: Option<FiberConfig>,
    parent: Option<Parent>,
}

impl<R: Send + 'static> ScopeBuilder<R> {
    pub fn new() -> Self {
        Self {
            computation: None,
            handler: None,
            config: None,
            parent: None,
        }
    }

    /// Set the computation body (required).
    pub fn computation<C>(mut self, computation: C) -> Self
    where
        C: AsyncFnOnce(&mut Context) -> Result<R, EffectError> + 'static,
    {
        self.computation = Some(Box::new(move |mut cx: Context| {
            async move { computation(&mut cx).await }.boxed_local()
        }));
        self
    }

    /// Set the handler function (required, or use `default_handler`).
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: AsyncFn(&Performed, &mut Handler<R>) -> Result<R, EffectError> + Send + Sync + 'static,
    {
        self.handler = Some(erase_handler(handler));
        self
    }

    /// Use a handler that declines every effect, forwarding it outwards.
    pub fn default_handler(mut self) -> Self {
        self.handler = Some(decline_all());
        self
    }

    /// Configure the fibers this scope creates.
    pub fn config(mut self, config: FiberConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub(crate) fn nested_in(mut self, parent: Parent) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Build the scope.
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<Scope<R>, BuildError> {
        let computation = self.computation.ok_or(BuildError::MissingComputation)?;
        let handler = self.handler.ok_or(BuildError::MissingHandler)?;
        Ok(Scope::new(computation, handler, self.config, self.parent))
    }

    /// Install `handler` and run the scope.
    pub fn with<H>(self, handler: H) -> Result<R, EffectError>
    where
        H: AsyncFn(&Performed, &mut Handler<R>) -> Result<R, EffectError> + Send + Sync + 'static,
    {
        self.handler(handler).build()?.run()
    }

    /// Run the scope with a handler that forwards every effect.
    pub fn with_default(self) -> Result<R, EffectError> {
        self.default_handler().build()?.run()
    }
}

impl<R: Send + 'static> Default for ScopeBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ScopeStatus;

    struct Double(i64);

    impl crate::core::Effect for Double {
        type Output = i64;
    }

    #[test]
    fn builder_requires_a_computation() {
        let result = ScopeBuilder::<i64>::new().default_handler().build();
        assert!(matches!(result, Err(BuildError::MissingComputation)));
    }

    #[test]
    fn builder_requires_a_handler() {
        let result = ScopeBuilder::<i64>::new().computation(async |_| Ok(1)).build();
        assert!(matches!(result, Err(BuildError::MissingHandler)));
    }

    #[test]
    fn build_errors_surface_through_with_default() {
        let result = ScopeBuilder::<i64>::new().with_default();
        assert_eq!(
            result,
            Err(EffectError::Build(BuildError::MissingComputation))
        );
    }

    #[test]
    fn fluent_api_builds_runnable_scope() {
        let scope = ScopeBuilder::new()
            .computation(async |cx| cx.perform(Double(21)).await)
            .handler(async |effect, handler| {
                let Double(n) = effect.downcast_ref::<Double>().unwrap();
                handler.resume(n * 2).await
            })
            .config(FiberConfig::named("double"))
            .build()
            .unwrap();

        assert_eq!(scope.status(), ScopeStatus::Initial);
        assert_eq!(scope.run(), Ok(42));
    }

    #[test]
    fn default_handler_is_unhandled_at_the_top() {
        let result = ScopeBuilder::new()
            .computation(async |cx| cx.perform(Double(1)).await)
            .with_default();
        assert!(matches!(result, Err(EffectError::UnhandledEffect { .. })));
    }
}
