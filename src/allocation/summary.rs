//! Allocation quality metrics and rule attribution.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Assignment rate | Assigned / total queue entries |
//! | Avg confidence | Mean confidence over results |
//! | Max load | Largest per-worker utilization |
//! | Avg load | Mean utilization over workers that received work |
//! | Load spread | Max load minus min load among those workers |
//! | Phases used | Distinct phases with at least one result |
//!
//! # Rule attribution
//!
//! A rule counts as executed when some result's reasoning names it
//! (`rule R1 (...)`, written whenever its effect reorders workers) or
//! contains a vocabulary keyword that also occurs in its description. This is
//! an audit heuristic: it over-reports when the reasoning mentions a
//! keyword for unrelated reasons (a senior selection mentions "senior"
//! whether or not a rule asked for it) and under-reports when an effect was
//! applied without reordering anything.

use crate::interpreter::keywords_in;
use crate::models::{AllocationResult, AllocationSummary, BusinessRule};

/// IDs of rules named by, or sharing a keyword with, any reasoning trail,
/// in rule order.
pub fn executed_rules<'r>(
    rules: impl IntoIterator<Item = &'r BusinessRule>,
    results: &[AllocationResult],
) -> Vec<String> {
    let trails: Vec<String> = results.iter().map(|r| r.reasoning.to_lowercase()).collect();
    rules
        .into_iter()
        .filter(|rule| {
            let mention = format!("rule {} (", rule.id.to_lowercase());
            trails.iter().any(|t| t.contains(&mention))
                || keywords_in(&rule.description)
                    .iter()
                    .any(|keyword| trails.iter().any(|t| t.contains(keyword)))
        })
        .map(|rule| rule.id.clone())
        .collect()
}

/// Allocation performance indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationKpi {
    /// Fraction of queue entries that received workers (1.0 when empty).
    pub assignment_rate: f64,
    /// Mean confidence (0.0 when nothing was assigned).
    pub avg_confidence: f64,
    /// Largest per-worker utilization.
    pub max_load: i64,
    /// Mean utilization across workers that received work.
    pub avg_load: f64,
    /// Max load minus min load across workers that received work.
    pub load_spread: i64,
    /// Distinct phases used.
    pub phases_used: usize,
}

impl AllocationKpi {
    /// Computes KPIs from a finished summary.
    pub fn calculate(summary: &AllocationSummary) -> Self {
        let assignment_rate = if summary.total_tasks == 0 {
            1.0
        } else {
            summary.assigned_tasks as f64 / summary.total_tasks as f64
        };

        let loads: Vec<i64> = summary.worker_utilization.values().copied().collect();
        let max_load = loads.iter().copied().max().unwrap_or(0);
        let min_load = loads.iter().copied().min().unwrap_or(0);
        let avg_load = if loads.is_empty() {
            0.0
        } else {
            loads.iter().sum::<i64>() as f64 / loads.len() as f64
        };

        Self {
            assignment_rate,
            avg_confidence: summary.average_confidence(),
            max_load,
            avg_load,
            load_spread: max_load - min_load,
            phases_used: summary.phase_distribution.len(),
        }
    }

    /// Whether the run meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_assignment_rate: f64, max_load_spread: i64) -> bool {
        self.assignment_rate >= min_assignment_rate && self.load_spread <= max_load_spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(task: &str, workers: &[&str], phase: u32, reasoning: &str) -> AllocationResult {
        AllocationResult {
            task_id: task.into(),
            task_name: String::new(),
            client_id: "C1".into(),
            client_name: String::new(),
            worker_ids: workers.iter().map(|w| w.to_string()).collect(),
            worker_names: workers.iter().map(|w| w.to_string()).collect(),
            phase,
            priority: 3,
            reasoning: reasoning.into(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_executed_rules_keyword_overlap() {
        let rules = vec![
            BusinessRule::new("R1", "Prefer SENIOR engineers"),
            BusinessRule::new("R2", "Keep costs down"),
            BusinessRule::new("R3", "Friday freeze"),
        ];
        let results = vec![result("T1", &["W1"], 1, "Average qualification 7.0 (senior).")];
        assert_eq!(executed_rules(&rules, &results), vec!["R1"]);
    }

    #[test]
    fn test_executed_rules_named_in_trail() {
        // an advisor-classified rule whose text holds no vocabulary word
        let rules = vec![
            BusinessRule::new("R1", "Be frugal"),
            BusinessRule::new("R10", "Be frugal"),
        ];
        let results = vec![result("T1", &["W1"], 1, "Ordering adjusted by rule R1 (cost).")];
        assert_eq!(executed_rules(&rules, &results), vec!["R1"]);
    }

    #[test]
    fn test_executed_rules_none_without_results() {
        let rules = vec![BusinessRule::new("R1", "balance load")];
        assert!(executed_rules(&rules, &[]).is_empty());
    }

    #[test]
    fn test_kpi_basic() {
        let mut s = AllocationSummary {
            total_tasks: 4,
            ..AllocationSummary::default()
        };
        s.add_result(result("T1", &["W1", "W2"], 1, ""), 2);
        s.add_result(result("T2", &["W1"], 2, ""), 3);
        s.add_result(result("T3", &["W3"], 2, ""), 1);
        s.add_unassigned("T4");

        let kpi = AllocationKpi::calculate(&s);
        assert!((kpi.assignment_rate - 0.75).abs() < 1e-10);
        assert!((kpi.avg_confidence - 0.9).abs() < 1e-10);
        // W1: 5, W2: 2, W3: 1
        assert_eq!(kpi.max_load, 5);
        assert_eq!(kpi.load_spread, 4);
        assert!((kpi.avg_load - 8.0 / 3.0).abs() < 1e-10);
        assert_eq!(kpi.phases_used, 2);
        assert!(kpi.meets_thresholds(0.75, 4));
        assert!(!kpi.meets_thresholds(0.8, 4));
        assert!(!kpi.meets_thresholds(0.5, 3));
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = AllocationKpi::calculate(&AllocationSummary::default());
        assert!((kpi.assignment_rate - 1.0).abs() < 1e-10);
        assert_eq!(kpi.max_load, 0);
        assert_eq!(kpi.load_spread, 0);
        assert_eq!(kpi.phases_used, 0);
    }
}
