//! Scopes and the orchestration loop that drives them.
//!
//! A scope binds one computation to one handler function. Running it
//! alternates control between the computation fiber and the handler fibers
//! it creates, polling one at a time:
//!
//! - `Initial`: start the computation
//! - `PerformedEffect`: offer the pending effect to this scope's handler
//! - `Forwarded`: offer it to the handler of the next enclosing scope
//! - `Aborted`: a handler returned without resuming; its value is the result
//! - `Computed`: the computation finished; wake the handlers still parked
//!   after their `resume`, most recent first, threading the result through
//!   each of them

use crate::builder::ScopeBuilder;
use crate::core::{downcast_value, Performed, ScopeId, Status, StatusHistory, Value};
use crate::runtime::config::FiberConfig;
use crate::runtime::context::Context;
use crate::runtime::fiber::{Fiber, Port, Step};
use crate::runtime::handler::{Answer, ErasedHandlerFn, HandlerInstance, HandlerStatus};
use crate::runtime::registry::Registry;
use crate::runtime::report::ScopeReport;
use crate::runtime::EffectError;
use futures::future::{FutureExt, LocalBoxFuture};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, debug_span, trace};

status_enum! {
    /// Lifecycle of a scope.
    #[derive(Copy, Eq)]
    pub enum ScopeStatus {
        Initial,
        PerformedEffect,
        Forwarded,
        Aborted,
        Computed,
    }
    final: [Aborted, Computed]
}

/// Forward offset at the start of every resume cycle.
const NOT_FORWARDING: isize = -1;

pub(crate) type ComputationFn<R> =
    Box<dyn FnOnce(Context) -> LocalBoxFuture<'static, Result<R, EffectError>>>;

/// Registry and fiber config a nested scope inherits from the computation
/// that opened it.
pub(crate) struct Parent {
    registry: Registry,
    config: FiberConfig,
}

impl Parent {
    pub(crate) fn new(registry: Registry, config: FiberConfig) -> Self {
        Self { registry, config }
    }
}

/// One computation bound to one handler function.
///
/// Build with [`Scope::builder`] (or the [`handle`](crate::handle) and
/// [`run`](crate::run) shortcuts) and consume with [`run`](Scope::run).
pub struct Scope<R> {
    id: ScopeId,
    computation: Option<ComputationFn<R>>,
    handler: ErasedHandlerFn,
    config: Option<FiberConfig>,
    parent: Option<Parent>,

    status: ScopeStatus,
    pending: Option<Performed>,
    continuation: Option<Fiber<Value, Performed>>,
    handler_stack: Vec<HandlerInstance>,
    forward_index: isize,
    result: Option<Result<Value, EffectError>>,

    history: StatusHistory<ScopeStatus>,
    handlers_invoked: usize,
    forwards: usize,
    discarded_handlers: usize,
    _result: PhantomData<fn() -> R>,
}

impl<R: Send + 'static> Scope<R> {
    pub(crate) fn new(
        computation: ComputationFn<R>,
        handler: ErasedHandlerFn,
        config: Option<FiberConfig>,
        parent: Option<Parent>,
    ) -> Self {
        Self {
            id: ScopeId::next(),
            computation: Some(computation),
            handler,
            config,
            parent,
            status: ScopeStatus::Initial,
            pending: None,
            continuation: None,
            handler_stack: Vec::new(),
            forward_index: NOT_FORWARDING,
            result: None,
            history: StatusHistory::new(),
            handlers_invoked: 0,
            forwards: 0,
            discarded_handlers: 0,
            _result: PhantomData,
        }
    }

    pub fn builder() -> ScopeBuilder<R> {
        ScopeBuilder::new()
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn status(&self) -> ScopeStatus {
        self.status
    }

    /// Drive the scope to completion.
    ///
    /// A scope opened through a [`Context`] runs inside the enclosing
    /// scope's registry; any other scope starts a fresh one.
    pub fn run(self) -> Result<R, EffectError> {
        self.run_with_report().0
    }

    /// Drive the scope inside an explicit registry.
    pub fn run_in(mut self, registry: &Registry) -> Result<R, EffectError> {
        let inherited = self
            .parent
            .take()
            .map(|parent| parent.config)
            .unwrap_or_default();
        self.execute(registry, inherited).0
    }

    /// Drive the scope to completion and describe how it got there.
    pub fn run_with_report(mut self) -> (Result<R, EffectError>, ScopeReport) {
        let (registry, inherited) = match self.parent.take() {
            Some(parent) => (parent.registry, parent.config),
            None => (Registry::new(), FiberConfig::default()),
        };
        self.execute(&registry, inherited)
    }

    fn execute(
        mut self,
        registry: &Registry,
        inherited: FiberConfig,
    ) -> (Result<R, EffectError>, ScopeReport) {
        let config = self.config.take().unwrap_or(inherited);
        let span = debug_span!("scope", id = %self.id, depth = registry.depth());
        let _entered = span.enter();

        let outcome = self.orchestrate(registry, &config);
        self.discard_fibers();
        match &outcome {
            Ok(_) => debug!(status = self.status.name(), "scope finished"),
            Err(err) => debug!(status = self.status.name(), error = %err, "scope failed"),
        }

        let report = self.report();
        (outcome.and_then(downcast_value::<R>), report)
    }

    fn orchestrate(
        &mut self,
        registry: &Registry,
        config: &FiberConfig,
    ) -> Result<Value, EffectError> {
        let _activation = registry.activate(self.id, Arc::clone(&self.handler))?;

        loop {
            match self.status {
                ScopeStatus::Initial => self.start(registry, config)?,
                ScopeStatus::PerformedEffect => {
                    let handler = Arc::clone(&self.handler);
                    self.dispatch(&handler, config)?;
                }
                ScopeStatus::Forwarded => {
                    let effect = self.pending_effect()?.name();
                    let target = registry
                        .resolve(self.forward_index)
                        .ok_or(EffectError::UnhandledEffect { effect })?;
                    debug!(effect, target = %target.scope, "forwarding effect");
                    self.dispatch(&target.handler, config)?;
                }
                ScopeStatus::Aborted => return self.take_result(),
                ScopeStatus::Computed if self.handler_stack.is_empty() => {
                    return self.take_result();
                }
                ScopeStatus::Computed => {
                    // A failed result ends the scope without waking parked handlers.
                    let value = self.take_result()?;
                    self.active_handler()?.continue_suspended()?;
                    self.drive_handler(Some(Ok(value)), config)?;
                }
            }
        }
    }

    fn start(&mut self, registry: &Registry, config: &FiberConfig) -> Result<(), EffectError> {
        let computation = self
            .computation
            .take()
            .ok_or_else(|| self.invariant("computation already started"))?;

        let scope = self.id;
        let fiber = Fiber::spawn(
            config.fiber_name("fn", scope.as_u64()),
            |port: Port<Value, Performed>| {
                let cx = Context::new(scope, port, registry.clone(), config.clone());
                computation(cx)
                    .map(|result| result.map(|value| Box::new(value) as Value))
                    .boxed_local()
            },
        );

        self.continuation = Some(fiber);
        self.step_computation(None)
    }

    /// Offer the pending effect to `handler`, bound to this scope's
    /// suspended computation.
    fn dispatch(&mut self, handler: &ErasedHandlerFn, config: &FiberConfig) -> Result<(), EffectError> {
        let effect = self.pending_effect()?.clone();
        let name = effect.name();
        let instance = HandlerInstance::start(config, handler, effect);
        debug!(
            handler = %instance.id(),
            effect = name,
            forward_index = self.forward_index,
            "dispatching effect"
        );
        self.handlers_invoked += 1;
        self.handler_stack.push(instance);
        self.drive_handler(None, config)
    }

    /// Run the innermost handler until it parks after a resume or returns.
    /// `answer` is what its pending `resume` receives; a freshly dispatched
    /// handler has none.
    fn drive_handler(&mut self, answer: Option<Answer>, config: &FiberConfig) -> Result<(), EffectError> {
        let mut answer = answer;
        loop {
            let step = match answer.take() {
                Some(answer) => self.active_handler()?.answer(answer)?,
                None => self.active_handler()?.begin()?,
            };
            match step {
                Step::Suspended(value) => {
                    self.forward_index = NOT_FORWARDING;
                    self.active_handler()?.mark_resumed();
                    self.step_computation(Some(value))?;

                    match self.status {
                        ScopeStatus::PerformedEffect => {
                            self.active_handler()?.mark_suspended();
                            return self.check_parked(config);
                        }
                        ScopeStatus::Computed => answer = Some(self.take_result()),
                        other => {
                            return Err(self.invariant(&format!("computation resumed into {other:?}")));
                        }
                    }
                }
                Step::Returned(result) => return self.finish_handler(result),
            }
        }
    }

    fn check_parked(&self, config: &FiberConfig) -> Result<(), EffectError> {
        let parked = self.handler_stack.len();
        if config.allows_parked(parked) {
            return Ok(());
        }
        Err(EffectError::ParkedLimit {
            scope: self.id,
            limit: config.max_parked.unwrap_or(parked),
        })
    }

    fn finish_handler(&mut self, result: Result<Value, EffectError>) -> Result<(), EffectError> {
        let mut instance = self
            .handler_stack
            .pop()
            .ok_or_else(|| self.invariant("handler returned with an empty handler stack"))?;
        let resumed = match instance.status() {
            HandlerStatus::Handling => false,
            HandlerStatus::Resumed => true,
            other => {
                return Err(self.invariant(&format!("{} returned while {other:?}", instance.id())));
            }
        };
        instance.mark_done();
        let handler = instance.id();
        drop(instance);

        match (resumed, result) {
            (false, Err(err)) if err.is_unhandled_marker() => {
                self.forward_index -= 1;
                self.forwards += 1;
                debug!(%handler, forward_index = self.forward_index, "handler declined");
                self.transition(ScopeStatus::Forwarded);
            }
            (false, result) => {
                debug!(%handler, failed = result.is_err(), "handler aborted the computation");
                self.pending = None;
                self.continuation = None;
                self.result = Some(result);
                self.transition(ScopeStatus::Aborted);
            }
            (true, Err(err)) if err.is_unhandled_marker() => {
                self.result = Some(Err(EffectError::UnhandledAfterResume));
            }
            (true, result) => {
                trace!(%handler, failed = result.is_err(), "handler finished after resume");
                self.result = Some(result);
            }
        }
        Ok(())
    }

    /// Poll the computation, handing it `value` as the result of its
    /// pending `perform`.
    fn step_computation(&mut self, value: Option<Value>) -> Result<(), EffectError> {
        let scope = self.id;
        let step = self
            .continuation
            .as_mut()
            .ok_or_else(|| EffectError::InvariantViolation(format!("{scope}: no computation to resume")))?
            .step(value)?;

        match step {
            Step::Suspended(effect) => {
                self.pending = Some(effect);
                self.transition(ScopeStatus::PerformedEffect);
            }
            Step::Returned(result) => {
                self.pending = None;
                self.continuation = None;
                self.result = Some(result);
                self.transition(ScopeStatus::Computed);
            }
        }
        Ok(())
    }

    fn transition(&mut self, to: ScopeStatus) {
        trace!(from = self.status.name(), to = to.name(), "scope status");
        self.history.record(self.status, to);
        self.status = to;
    }

    fn pending_effect(&self) -> Result<&Performed, EffectError> {
        self.pending
            .as_ref()
            .ok_or_else(|| self.invariant("no pending effect"))
    }

    fn active_handler(&mut self) -> Result<&mut HandlerInstance, EffectError> {
        let scope = self.id;
        self.handler_stack.last_mut().ok_or_else(|| {
            EffectError::InvariantViolation(format!("{scope} has no active handler"))
        })
    }

    fn take_result(&mut self) -> Result<Value, EffectError> {
        let scope = self.id;
        self.result.take().unwrap_or_else(|| {
            Err(EffectError::InvariantViolation(format!("{scope} has no result")))
        })
    }

    /// Drop every fiber still owned by the scope. Parked handlers and a
    /// suspended computation are discarded without running any more user
    /// code.
    fn discard_fibers(&mut self) {
        if !self.handler_stack.is_empty() {
            debug!(count = self.handler_stack.len(), "discarding parked handlers");
        }
        self.discarded_handlers += self.handler_stack.len();
        while let Some(instance) = self.handler_stack.pop() {
            drop(instance);
        }
        self.continuation = None;
        self.pending = None;
    }

    fn report(&mut self) -> ScopeReport {
        ScopeReport {
            scope: self.id,
            history: std::mem::take(&mut self.history),
            handlers_invoked: self.handlers_invoked,
            forwards: self.forwards,
            discarded_handlers: self.discarded_handlers,
        }
    }

    fn invariant(&self, message: &str) -> EffectError {
        EffectError::InvariantViolation(format!("{}: {message}", self.id))
    }
}
