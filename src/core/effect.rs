//! Effect declarations and their type-erased, performed form.

use crate::runtime::EffectError;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A typed request a computation can perform.
///
/// The effect value itself carries no behavior; `Output` is the type the
/// performer receives back once a handler resumes it. Declare effects by
/// hand or with the [`effect!`](crate::effect) macro.
///
/// ```rust
/// use effectful::core::Effect;
///
/// struct Next;
///
/// impl Effect for Next {
///     type Output = String;
/// }
/// ```
pub trait Effect: Send + Sync + 'static {
    type Output: Send + 'static;
}

/// Type-erased value handed between fibers.
pub(crate) type Value = Box<dyn Any + Send>;

/// An effect after it has been performed, as seen by handler functions.
///
/// Handlers inspect it with [`is`](Performed::is) or
/// [`downcast_ref`](Performed::downcast_ref) to decide whether they
/// recognize the request. Cloning is cheap: the effect is shared, so the
/// same request can be offered to several handlers while it is forwarded.
#[derive(Clone)]
pub struct Performed {
    effect: Arc<dyn Any + Send + Sync>,
    name: &'static str,
    output: TypeId,
    output_name: &'static str,
}

impl Performed {
    pub(crate) fn new<E: Effect>(effect: E) -> Self {
        Self {
            effect: Arc::new(effect),
            name: type_name::<E>(),
            output: TypeId::of::<E::Output>(),
            output_name: type_name::<E::Output>(),
        }
    }

    /// Check whether this is an `E`.
    pub fn is<E: Effect>(&self) -> bool {
        self.effect.is::<E>()
    }

    /// Borrow the effect as an `E`, if it is one.
    pub fn downcast_ref<E: Effect>(&self) -> Option<&E> {
        self.effect.downcast_ref::<E>()
    }

    /// Type name of the performed effect.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name of the value the performer expects back.
    pub fn output_name(&self) -> &'static str {
        self.output_name
    }

    /// Reject resume values whose type differs from the declared output.
    pub(crate) fn check_output<T: 'static>(&self) -> Result<(), EffectError> {
        if TypeId::of::<T>() == self.output {
            Ok(())
        } else {
            Err(EffectError::ResumeTypeMismatch {
                effect: self.name,
                expected: self.output_name,
                found: type_name::<T>(),
            })
        }
    }
}

impl fmt::Debug for Performed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Performed")
            .field("effect", &self.name)
            .field("output", &self.output_name)
            .finish()
    }
}

/// Recover a concrete value from the erased form.
pub(crate) fn downcast_value<T: 'static>(value: Value) -> Result<T, EffectError> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| EffectError::ResultTypeMismatch {
            expected: type_name::<T>(),
        })
}
