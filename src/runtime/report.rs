//! Serializable summary of a finished scope.

use crate::core::{ScopeId, Status, StatusHistory};
use crate::runtime::scope::ScopeStatus;
use serde::{Deserialize, Serialize};

/// What happened while a scope ran.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScopeReport {
    pub scope: ScopeId,

    /// Every status change, in order.
    pub history: StatusHistory<ScopeStatus>,

    /// Handler invocations started on behalf of this scope, including the
    /// ones that ran in enclosing scopes after a forward.
    pub handlers_invoked: usize,

    /// Times a handler declined an effect of this scope.
    pub forwards: usize,

    /// Parked handlers dropped without being continued.
    pub discarded_handlers: usize,
}

impl ScopeReport {
    pub fn final_status(&self) -> Option<&ScopeStatus> {
        self.history.last_status()
    }

    /// Whether the scope reached `Aborted` or `Computed`.
    pub fn is_complete(&self) -> bool {
        self.final_status().is_some_and(|status| status.is_final())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScopeReport {
        let mut history = StatusHistory::new();
        history.record(ScopeStatus::Initial, ScopeStatus::PerformedEffect);
        history.record(ScopeStatus::PerformedEffect, ScopeStatus::Forwarded);
        history.record(ScopeStatus::Forwarded, ScopeStatus::Computed);
        ScopeReport {
            scope: ScopeId::next(),
            history,
            handlers_invoked: 2,
            forwards: 1,
            discarded_handlers: 0,
        }
    }

    #[test]
    fn final_status_is_the_last_transition_target() {
        let report = sample();
        assert_eq!(report.final_status(), Some(&ScopeStatus::Computed));
        assert!(report.is_complete());
    }

    #[test]
    fn empty_history_is_incomplete() {
        let report = ScopeReport {
            scope: ScopeId::next(),
            history: StatusHistory::new(),
            handlers_invoked: 0,
            forwards: 0,
            discarded_handlers: 0,
        };
        assert!(report.final_status().is_none());
        assert!(!report.is_complete());
    }

    #[test]
    fn json_keeps_counters_and_path() {
        let report = sample();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"forwards\": 1"));

        let restored = ScopeReport::from_json(&json).unwrap();
        assert_eq!(restored.scope, report.scope);
        assert_eq!(restored.handlers_invoked, 2);
        assert_eq!(restored.history.get_path(), report.history.get_path());
    }
}
