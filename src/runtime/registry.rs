//! Stack of the scopes that are currently running.
//!
//! A `Registry` is shared by a top-level scope and every scope nested inside
//! it through a [`Context`](crate::Context). Entries are pushed when a scope
//! starts and popped when it ends, always at the tail, so the tail is the
//! innermost running scope. Forwarding walks outwards from the tail by index.

use crate::core::ScopeId;
use crate::runtime::handler::ErasedHandlerFn;
use crate::runtime::EffectError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) scope: ScopeId,
    pub(crate) handler: ErasedHandlerFn,
}

/// Ordered stack of active scopes, outermost first.
#[derive(Clone, Default)]
pub struct Registry {
    scopes: Arc<Mutex<Vec<Entry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active scopes.
    pub fn depth(&self) -> usize {
        self.scopes.lock().len()
    }

    /// The innermost active scope.
    pub fn innermost(&self) -> Option<ScopeId> {
        self.scopes.lock().last().map(|entry| entry.scope)
    }

    /// Ids of the active scopes, outermost first.
    pub fn active_scopes(&self) -> Vec<ScopeId> {
        self.scopes.lock().iter().map(|entry| entry.scope).collect()
    }

    /// Register `scope` as the innermost active scope until the returned
    /// guard is dropped.
    pub(crate) fn activate(
        &self,
        scope: ScopeId,
        handler: ErasedHandlerFn,
    ) -> Result<Activation, EffectError> {
        let mut scopes = self.scopes.lock();
        if scopes.iter().any(|entry| entry.scope == scope) {
            return Err(EffectError::ReentrantScope(scope));
        }
        scopes.push(Entry { scope, handler });
        Ok(Activation {
            registry: self.clone(),
            scope,
        })
    }

    /// Resolve a forwarding offset against the tail: `-1` is the innermost
    /// scope, `-2` its parent, and so on.
    pub(crate) fn resolve(&self, forward_index: isize) -> Option<Entry> {
        let scopes = self.scopes.lock();
        let index = scopes.len() as isize + forward_index;
        if index < 0 {
            return None;
        }
        scopes.get(index as usize).cloned()
    }
}

/// Keeps a scope registered; pops it on drop.
pub(crate) struct Activation {
    registry: Registry,
    scope: ScopeId,
}

impl Drop for Activation {
    fn drop(&mut self) {
        let mut scopes = self.registry.scopes.lock();
        match scopes.last() {
            Some(entry) if entry.scope == self.scope => {
                scopes.pop();
            }
            _ => {
                error!(scope = %self.scope, "scope closed while an inner scope is still active");
                scopes.retain(|entry| entry.scope != self.scope);
            }
        }
    }
}
