//! Handler invocations.
//!
//! Each time an effect is dispatched, the scope starts a new
//! [`HandlerInstance`]: one run of a handler function against one performed
//! effect, as its own fiber. Handler-function code talks to its instance
//! through the [`Handler`] facade.

use crate::core::{downcast_value, HandlerId, Performed, Value};
use crate::runtime::config::FiberConfig;
use crate::runtime::fiber::{Fiber, Port, Step};
use crate::runtime::EffectError;
use futures::future::{FutureExt, LocalBoxFuture};
use std::marker::PhantomData;
use std::ops::AsyncFn;
use std::sync::Arc;
use tracing::trace;

status_enum! {
    /// Lifecycle of one handler invocation.
    #[derive(Copy, Eq)]
    pub enum HandlerStatus {
        /// Created, body not started yet.
        Initial,
        /// Body running, continuation not resumed yet.
        Handling,
        /// Resumed the computation, which then performed another effect;
        /// parked until the scope hands back the final result.
        Suspended,
        /// Resumed and back in control of its body.
        Resumed,
        Done,
    }
    final: [Done]
}

/// What a pending `resume` call receives.
pub(crate) type Answer = Result<Value, EffectError>;

/// Handler-fiber side of one invocation, before typing.
pub(crate) struct HandlerPort {
    id: HandlerId,
    effect: Performed,
    port: Port<Answer, Value>,
}

/// A handler function with its result type erased, so that it can be
/// invoked on behalf of any scope it is forwarded to.
pub(crate) type ErasedHandlerFn = Arc<
    dyn Fn(&Performed, HandlerPort) -> LocalBoxFuture<'static, Result<Value, EffectError>>
        + Send
        + Sync,
>;

pub(crate) fn erase_handler<R, H>(handler: H) -> ErasedHandlerFn
where
    R: Send + 'static,
    H: AsyncFn(&Performed, &mut Handler<R>) -> Result<R, EffectError> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |effect: &Performed, port: HandlerPort| {
        let handler = Arc::clone(&handler);
        let effect = effect.clone();
        async move {
            let mut control = Handler::new(port);
            (*handler)(&effect, &mut control)
                .await
                .map(|result| Box::new(result) as Value)
        }
        .boxed_local()
    })
}

/// Handler function that declines every effect.
pub(crate) fn decline_all() -> ErasedHandlerFn {
    Arc::new(|_: &Performed, _: HandlerPort| async { unhandled::<Value>() }.boxed_local())
}

/// Decline the effect being handled, forwarding it to the next enclosing
/// scope.
pub fn unhandled<T>() -> Result<T, EffectError> {
    Err(EffectError::Unhandled)
}

/// Control handed to handler-function code for one performed effect.
///
/// `R` is the result type of the scope the handler function belongs to.
pub struct Handler<R> {
    inner: HandlerPort,
    resumed: bool,
    _result: PhantomData<fn() -> R>,
}

impl<R: Send + 'static> Handler<R> {
    fn new(inner: HandlerPort) -> Self {
        Self {
            inner,
            resumed: false,
            _result: PhantomData,
        }
    }

    pub fn id(&self) -> HandlerId {
        self.inner.id
    }

    /// The effect this invocation is handling.
    pub fn effect(&self) -> &Performed {
        &self.inner.effect
    }

    pub fn has_resumed(&self) -> bool {
        self.resumed
    }

    /// Resume the computation with `value` as the result of its `perform`.
    ///
    /// Completes once the computation has produced its final result: right
    /// away if it finishes without performing again, otherwise after every
    /// later effect has been handled and the handlers invoked after this one
    /// have finished. A failed computation comes back as `Err`.
    ///
    /// Continuations are one-shot: a second call fails with
    /// [`EffectError::AlreadyResumed`]. A `value` of the wrong type fails
    /// with [`EffectError::ResumeTypeMismatch`] and leaves the continuation
    /// untouched.
    pub async fn resume<T: Send + 'static>(&mut self, value: T) -> Result<R, EffectError> {
        if self.resumed {
            return Err(EffectError::AlreadyResumed);
        }
        self.inner.effect.check_output::<T>()?;
        self.resumed = true;

        trace!(handler = %self.inner.id, effect = self.inner.effect.name(), "resuming");
        let answer = self.inner.port.suspend(Box::new(value) as Value).await;
        answer.and_then(downcast_value::<R>)
    }

    /// Decline the effect; the scope forwards it outwards.
    ///
    /// Only meaningful before `resume`. Return it from the handler
    /// function: `return handler.unhandled();`.
    pub fn unhandled<T>(&self) -> Result<T, EffectError> {
        unhandled()
    }
}

/// Scope-side record of one handler invocation.
pub(crate) struct HandlerInstance {
    id: HandlerId,
    status: HandlerStatus,
    fiber: Fiber<Answer, Value>,
}

impl HandlerInstance {
    /// Bind `handler` to `effect` as a fresh fiber. Nothing runs until
    /// [`begin`](HandlerInstance::begin).
    pub(crate) fn start(config: &FiberConfig, handler: &ErasedHandlerFn, effect: Performed) -> Self {
        let id = HandlerId::next();
        let fiber = Fiber::spawn(config.fiber_name("handler", id.as_u64()), |port| {
            let inner = HandlerPort {
                id,
                effect: effect.clone(),
                port,
            };
            handler(&effect, inner)
        });

        let mut instance = Self {
            id,
            status: HandlerStatus::Initial,
            fiber,
        };
        instance.status = HandlerStatus::Handling;
        trace!(handler = %id, fiber = instance.fiber.name(), "handler started");
        instance
    }

    pub(crate) fn id(&self) -> HandlerId {
        self.id
    }

    pub(crate) fn status(&self) -> HandlerStatus {
        self.status
    }

    /// Run the body until it resumes or returns.
    pub(crate) fn begin(&mut self) -> Result<Step<Value>, EffectError> {
        if self.status != HandlerStatus::Handling {
            return Err(self.unexpected("begin"));
        }
        self.fiber.step(None)
    }

    pub(crate) fn mark_resumed(&mut self) {
        self.status = HandlerStatus::Resumed;
    }

    pub(crate) fn mark_suspended(&mut self) {
        self.status = HandlerStatus::Suspended;
    }

    pub(crate) fn mark_done(&mut self) {
        self.status = HandlerStatus::Done;
    }

    /// Answer the `resume` call of a handler that is in control, and run it
    /// until it returns.
    pub(crate) fn answer(&mut self, answer: Answer) -> Result<Step<Value>, EffectError> {
        if self.status != HandlerStatus::Resumed {
            return Err(self.unexpected("answer"));
        }
        self.fiber.step(Some(answer))
    }

    /// Hand control back to a parked handler. The next
    /// [`answer`](HandlerInstance::answer) delivers the scope's result.
    pub(crate) fn continue_suspended(&mut self) -> Result<(), EffectError> {
        if self.status != HandlerStatus::Suspended {
            return Err(self.unexpected("continue"));
        }
        self.status = HandlerStatus::Resumed;
        Ok(())
    }

    fn unexpected(&self, action: &str) -> EffectError {
        EffectError::InvariantViolation(format!(
            "cannot {action} {} while {:?}",
            self.id, self.status
        ))
    }
}
