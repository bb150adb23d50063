//! Suspendable executions built from a boxed future and a shared mailbox.
//!
//! A fiber runs one body (a computation or a handler function) as a future
//! that only ever waits on the runtime. The body hands an `Out` event to its
//! driver through [`Port::suspend`], which leaves the event in the mailbox
//! and stays pending until the driver polls it again with the next `In`
//! value. Only one side ever runs at a time: the driver polls, the body runs
//! until its next suspension point, and control comes back.
//!
//! A parked fiber is just its future: no thread and no stack. Dropping a
//! [`Fiber`] discards it, so none of the code after its suspension point
//! ever runs.

use crate::core::Value;
use crate::runtime::EffectError;
use futures::future::{FutureExt, LocalBoxFuture};
use std::any::Any;
use std::cell::RefCell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tracing::trace;

type Body = LocalBoxFuture<'static, Result<Value, EffectError>>;

struct Mailbox<In, Out> {
    inbox: Option<In>,
    outbox: Option<Out>,
}

/// The body-side end of the mailbox.
pub(crate) struct Port<In, Out> {
    mailbox: Rc<RefCell<Mailbox<In, Out>>>,
}

impl<In, Out> Port<In, Out> {
    /// Hand `event` to the driver and wait until it answers.
    pub(crate) fn suspend(&self, event: Out) -> Suspend<'_, In, Out> {
        Suspend {
            port: self,
            event: Some(event),
        }
    }
}

/// Future returned by [`Port::suspend`].
pub(crate) struct Suspend<'a, In, Out> {
    port: &'a Port<In, Out>,
    event: Option<Out>,
}

impl<In, Out: Unpin> Future for Suspend<'_, In, Out> {
    type Output = In;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<In> {
        let this = self.get_mut();
        let mut mailbox = this.port.mailbox.borrow_mut();
        if let Some(event) = this.event.take() {
            mailbox.outbox = Some(event);
            return Poll::Pending;
        }
        match mailbox.inbox.take() {
            Some(input) => Poll::Ready(input),
            None => Poll::Pending,
        }
    }
}

/// How far one poll of a fiber got.
pub(crate) enum Step<Out> {
    /// The body suspended with an event for its driver.
    Suspended(Out),
    /// The body finished.
    Returned(Result<Value, EffectError>),
}

/// The driver-side handle of a fiber.
pub(crate) struct Fiber<In, Out> {
    name: String,
    mailbox: Rc<RefCell<Mailbox<In, Out>>>,
    body: Option<Body>,
}

impl<In: 'static, Out: 'static> Fiber<In, Out> {
    /// Create a fiber. Its body does not run until the first [`step`](Fiber::step).
    pub(crate) fn spawn<F>(name: String, body: F) -> Self
    where
        F: FnOnce(Port<In, Out>) -> Body,
    {
        let mailbox = Rc::new(RefCell::new(Mailbox {
            inbox: None,
            outbox: None,
        }));
        let port = Port {
            mailbox: Rc::clone(&mailbox),
        };

        let fiber_name = name.clone();
        let body = AssertUnwindSafe(body(port))
            .catch_unwind()
            .map(move |outcome| match outcome {
                Ok(result) => result,
                Err(payload) => Err(EffectError::Panicked {
                    fiber: fiber_name,
                    message: panic_message(payload.as_ref()),
                }),
            })
            .boxed_local();

        Self {
            name,
            mailbox,
            body: Some(body),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Run the body until it suspends or returns, handing it `input` first.
    pub(crate) fn step(&mut self, input: Option<In>) -> Result<Step<Out>, EffectError> {
        let body = self.body.as_mut().ok_or_else(|| {
            EffectError::InvariantViolation(format!("fiber `{}` already returned", self.name))
        })?;
        self.mailbox.borrow_mut().inbox = input;

        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        match body.as_mut().poll(&mut cx) {
            Poll::Ready(result) => {
                self.body = None;
                Ok(Step::Returned(result))
            }
            Poll::Pending => match self.mailbox.borrow_mut().outbox.take() {
                Some(event) => Ok(Step::Suspended(event)),
                None => Err(EffectError::Stalled {
                    fiber: self.name.clone(),
                }),
            },
        }
    }
}

impl<In, Out> Drop for Fiber<In, Out> {
    fn drop(&mut self) {
        if self.body.is_some() {
            trace!(fiber = %self.name, "discarding suspended fiber");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
