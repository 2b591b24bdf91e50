//! Ordering context for rule effects.

use std::collections::HashMap;

/// Run-time allocation state read by rule effects.
///
/// Holds the running per-worker utilization accumulator and the group tag of
/// the client whose task is being allocated. One context belongs to one
/// allocation run; it is never shared between runs.
#[derive(Debug, Clone, Default)]
pub struct OrderingContext {
    /// Group tag of the requesting client.
    pub client_group: String,
    /// Duration units consumed so far (worker_id → units).
    pub utilization: HashMap<String, i64>,
}

impl OrderingContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the requesting client's group tag.
    pub fn with_client_group(mut self, group: impl Into<String>) -> Self {
        self.client_group = group.into();
        self
    }

    /// Sets a worker's utilization.
    pub fn with_utilization(mut self, worker_id: impl Into<String>, units: i64) -> Self {
        self.utilization.insert(worker_id.into(), units);
        self
    }

    /// Units consumed by a worker so far.
    pub fn utilization_of(&self, worker_id: &str) -> i64 {
        self.utilization.get(worker_id).copied().unwrap_or(0)
    }

    /// Adds `units` to a worker's utilization.
    pub fn record_load(&mut self, worker_id: &str, units: i64) {
        *self.utilization.entry(worker_id.to_string()).or_insert(0) += units;
    }

    /// Whether `group` matches the client's group (case-insensitive).
    /// An empty client group matches nothing.
    pub fn is_client_group(&self, group: &str) -> bool {
        !self.client_group.is_empty() && self.client_group.eq_ignore_ascii_case(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_utilization() {
        let mut ctx = OrderingContext::new().with_utilization("W1", 2);
        ctx.record_load("W1", 3);
        ctx.record_load("W2", 1);
        assert_eq!(ctx.utilization_of("W1"), 5);
        assert_eq!(ctx.utilization_of("W2"), 1);
        assert_eq!(ctx.utilization_of("W3"), 0);
    }

    #[test]
    fn test_context_client_group() {
        let ctx = OrderingContext::new().with_client_group("GroupA");
        assert!(ctx.is_client_group("groupa"));
        assert!(!ctx.is_client_group("GroupB"));
        assert!(!OrderingContext::new().is_client_group(""));
    }
}
