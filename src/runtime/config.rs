//! Fiber configuration.

/// Configuration for the fibers a scope creates.
///
/// Every computation and every handler invocation runs as its own fiber: a
/// suspendable body that holds no thread and no stack while parked. Nested
/// scopes opened through a [`Context`](crate::Context) inherit the
/// enclosing scope's configuration unless they set their own.
#[derive(Debug, Clone, PartialEq)]
pub struct FiberConfig {
    /// Prefix for fiber names, e.g. `effectful-fn-3`.
    pub name_prefix: String,
    /// Most handlers a scope may keep parked after `resume`; `None` means
    /// no limit.
    pub max_parked: Option<usize>,
}

impl Default for FiberConfig {
    fn default() -> Self {
        Self {
            name_prefix: "effectful".to_string(),
            max_parked: None,
        }
    }
}

impl FiberConfig {
    /// Create a config with a custom fiber name prefix.
    pub fn named(prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Cap the number of parked handlers.
    pub fn with_max_parked(mut self, limit: usize) -> Self {
        self.max_parked = Some(limit);
        self
    }

    pub(crate) fn fiber_name(&self, kind: &str, id: u64) -> String {
        format!("{}-{}-{}", self.name_prefix, kind, id)
    }

    pub(crate) fn allows_parked(&self, parked: usize) -> bool {
        self.max_parked.map_or(true, |limit| parked <= limit)
    }
}
