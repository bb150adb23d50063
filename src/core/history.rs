//! Status transition history.
//!
//! Every scope records the statuses it passes through while its
//! orchestration loop runs. The history is plain data: it can be inspected
//! after a run or exported as part of a [`ScopeReport`](crate::ScopeReport).

use super::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single status change.
///
/// # Example
///
/// ```rust
/// use effectful::core::StatusTransition;
/// use effectful::ScopeStatus;
/// use chrono::Utc;
///
/// let transition = StatusTransition {
///     from: ScopeStatus::Initial,
///     to: ScopeStatus::PerformedEffect,
///     timestamp: Utc::now(),
///     step: 0,
/// };
/// assert_eq!(transition.step, 0);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StatusTransition<S: Status> {
    /// The status being left
    pub from: S,
    /// The status being entered
    pub to: S,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
    /// Position of this change within its history, starting at zero
    pub step: usize,
}

/// Ordered history of status changes.
///
/// # Example
///
/// ```rust
/// use effectful::core::StatusHistory;
/// use effectful::ScopeStatus;
///
/// let mut history = StatusHistory::new();
/// history.record(ScopeStatus::Initial, ScopeStatus::PerformedEffect);
/// history.record(ScopeStatus::PerformedEffect, ScopeStatus::Computed);
///
/// let path = history.get_path();
/// assert_eq!(
///     path,
///     vec![
///         &ScopeStatus::Initial,
///         &ScopeStatus::PerformedEffect,
///         &ScopeStatus::Computed,
///     ]
/// );
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StatusHistory<S: Status> {
    transitions: Vec<StatusTransition<S>>,
}

impl<S: Status> Default for StatusHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Status> StatusHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a status change, stamped with the current time.
    pub fn record(&mut self, from: S, to: S) {
        let step = self.transitions.len();
        self.transitions.push(StatusTransition {
            from,
            to,
            timestamp: Utc::now(),
            step,
        });
    }

    /// Get the path of statuses traversed.
    ///
    /// Returns the starting status followed by the `to` status of each
    /// recorded change. Empty if nothing was recorded.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// The most recently entered status, if any change was recorded.
    pub fn last_status(&self) -> Option<&S> {
        self.transitions.last().map(|t| &t.to)
    }

    /// Count how many times `status` was entered.
    pub fn times_entered(&self, status: &S) -> usize {
        self.transitions.iter().filter(|t| &t.to == status).count()
    }

    /// Elapsed time between the first and last recorded change.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.first()?, self.transitions.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Get all transitions in order.
    pub fn transitions(&self) -> &[StatusTransition<S>] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
