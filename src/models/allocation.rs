//! Allocation output model.
//!
//! An [`AllocationSummary`] is the complete output of one allocation run:
//! one [`AllocationResult`] per allocated queue entry, plus aggregate
//! utilization and distribution figures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One allocated task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    /// Allocated task ID.
    pub task_id: String,
    /// Allocated task name.
    pub task_name: String,
    /// Requesting client ID.
    pub client_id: String,
    /// Requesting client name.
    pub client_name: String,
    /// Assigned worker IDs, in selection order.
    pub worker_ids: Vec<String>,
    /// Assigned worker names, parallel to `worker_ids`.
    pub worker_names: Vec<String>,
    /// Chosen phase.
    pub phase: u32,
    /// Requesting client's priority level.
    pub priority: i64,
    /// Human-readable reasoning trail.
    pub reasoning: String,
    /// Heuristic constraint-satisfaction score in [0, 1].
    pub confidence: f64,
}

/// Aggregate output of one allocation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    /// Queue entries considered.
    pub total_tasks: usize,
    /// Queue entries that received workers.
    pub assigned_tasks: usize,
    /// Queue entries left without workers.
    pub unassigned_tasks: usize,
    /// Duration units consumed per worker ID.
    pub worker_utilization: BTreeMap<String, i64>,
    /// Allocated entries per phase.
    pub phase_distribution: BTreeMap<u32, usize>,
    /// Allocated entries per client priority level.
    pub priority_distribution: BTreeMap<i64, usize>,
    /// IDs of rules whose effect was detected in the reasoning trails.
    pub rules_executed: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// All results, in allocation order.
    pub allocations: Vec<AllocationResult>,
}

impl AllocationSummary {
    /// Records a successful allocation and updates the aggregates.
    pub fn add_result(&mut self, result: AllocationResult, duration: i64) {
        for worker_id in &result.worker_ids {
            *self
                .worker_utilization
                .entry(worker_id.clone())
                .or_insert(0) += duration;
        }
        *self.phase_distribution.entry(result.phase).or_insert(0) += 1;
        *self
            .priority_distribution
            .entry(result.priority)
            .or_insert(0) += 1;
        self.assigned_tasks += 1;
        self.allocations.push(result);
    }

    /// Records an unassigned queue entry.
    pub fn add_unassigned(&mut self, warning: impl Into<String>) {
        self.unassigned_tasks += 1;
        self.warnings.push(warning.into());
    }

    /// Whether every queue entry was allocated.
    pub fn is_complete(&self) -> bool {
        self.unassigned_tasks == 0
    }

    /// Finds the first result for a task.
    pub fn result_for_task(&self, task_id: &str) -> Option<&AllocationResult> {
        self.allocations.iter().find(|r| r.task_id == task_id)
    }

    /// Returns all results a worker takes part in.
    pub fn results_for_worker(&self, worker_id: &str) -> Vec<&AllocationResult> {
        self.allocations
            .iter()
            .filter(|r| r.worker_ids.iter().any(|w| w == worker_id))
            .collect()
    }

    /// Mean confidence across results (0.0 if none).
    pub fn average_confidence(&self) -> f64 {
        if self.allocations.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.allocations.iter().map(|r| r.confidence).sum();
        sum / self.allocations.len() as f64
    }
}
