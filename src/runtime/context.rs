//! The computation side of a scope.

use crate::builder::ScopeBuilder;
use crate::core::{downcast_value, Effect, Performed, ScopeId, Value};
use crate::runtime::config::FiberConfig;
use crate::runtime::fiber::Port;
use crate::runtime::handler::Handler;
use crate::runtime::registry::Registry;
use crate::runtime::scope::Parent;
use crate::runtime::EffectError;
use std::ops::{AsyncFn, AsyncFnOnce};
use tracing::trace;

/// Handle passed to a computation body.
///
/// `perform` is the only suspension point of a computation. Scopes opened
/// through [`handle`](Context::handle) or [`run`](Context::run) nest inside
/// this one: effects they decline are forwarded here.
pub struct Context {
    scope: ScopeId,
    port: Port<Value, Performed>,
    registry: Registry,
    config: FiberConfig,
}

impl Context {
    pub(crate) fn new(
        scope: ScopeId,
        port: Port<Value, Performed>,
        registry: Registry,
        config: FiberConfig,
    ) -> Self {
        Self {
            scope,
            port,
            registry,
            config,
        }
    }

    /// Perform `effect` and suspend until a handler resumes with its result.
    ///
    /// If the handler aborts instead, this call never completes: the rest
    /// of the computation is discarded.
    pub async fn perform<E: Effect>(&mut self, effect: E) -> Result<E::Output, EffectError> {
        let performed = Performed::new(effect);
        trace!(scope = %self.scope, effect = performed.name(), "performing");
        let value = self.port.suspend(performed).await;
        downcast_value::<E::Output>(value).map_err(|_| {
            EffectError::InvariantViolation(format!(
                "{} was resumed with a value that is not a `{}`",
                self.scope,
                std::any::type_name::<E::Output>()
            ))
        })
    }

    /// Id of the scope running this computation.
    pub fn scope_id(&self) -> ScopeId {
        self.scope
    }

    /// The registry this computation's scope is active in.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Start building a scope nested inside this one.
    ///
    /// The nested scope runs to completion inside the call to its
    /// [`run`](crate::Scope::run); effects it forwards are handled by this
    /// scope's handlers on its behalf.
    pub fn handle<R, C>(&self, computation: C) -> ScopeBuilder<R>
    where
        R: Send + 'static,
        C: AsyncFnOnce(&mut Context) -> Result<R, EffectError> + 'static,
    {
        ScopeBuilder::new()
            .computation(computation)
            .nested_in(Parent::new(self.registry.clone(), self.config.clone()))
    }

    /// Run `computation` in a nested scope handled by `handler`.
    pub fn run<R, C, H>(&self, computation: C, handler: H) -> Result<R, EffectError>
    where
        R: Send + 'static,
        C: AsyncFnOnce(&mut Context) -> Result<R, EffectError> + 'static,
        H: AsyncFn(&Performed, &mut Handler<R>) -> Result<R, EffectError> + Send + Sync + 'static,
    {
        self.handle(computation).with(handler)
    }

    /// Run `computation` in a nested scope that forwards every effect to
    /// the enclosing scopes.
    pub fn handle_with_default<R, C>(&self, computation: C) -> Result<R, EffectError>
    where
        R: Send + 'static,
        C: AsyncFnOnce(&mut Context) -> Result<R, EffectError> + 'static,
    {
        self.handle(computation).with_default()
    }
}
