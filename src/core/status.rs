//! Lifecycle status trait shared by scopes and handler instances.
//!
//! Scopes and handler invocations each move through a small, fixed set of
//! statuses. This trait gives them a common, pure vocabulary for naming and
//! classifying those statuses, so both can be recorded in a
//! [`StatusHistory`](super::StatusHistory) and written to logs.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for lifecycle statuses.
///
/// All methods are pure. Implementations are usually generated with the
/// [`status_enum!`](crate::status_enum) macro.
///
/// # Required Traits
///
/// - `Clone`: statuses are copied into history records
/// - `PartialEq`: statuses are compared by the orchestration loop
/// - `Debug`: statuses appear in diagnostics
/// - `Serialize` + `Deserialize`: histories are exported as JSON reports
///
/// # Example
///
/// ```rust
/// use effectful::core::Status;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Phase {
///     Warmup,
///     Steady,
///     Drained,
/// }
///
/// impl Status for Phase {
///     fn name(&self) -> &str {
///         match self {
///             Self::Warmup => "Warmup",
///             Self::Steady => "Steady",
///             Self::Drained => "Drained",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Drained)
///     }
/// }
///
/// assert!(Phase::Drained.is_final());
/// ```
pub trait Status:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the status name for display and logging.
    fn name(&self) -> &str;

    /// Check if this is a terminal status.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}
