//! Priority weights.
//!
//! Callers express what matters most for a run as weighted categories
//! (e.g. "Speed", "Fairness"). The allocation queue reads the weight of the
//! speed category.

use serde::{Deserialize, Serialize};

/// A weighted priority category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeight {
    /// Category name.
    pub category: String,
    /// Relative weight.
    pub weight: f64,
}

impl PriorityWeight {
    /// Creates a weight.
    pub fn new(category: impl Into<String>, weight: f64) -> Self {
        Self {
            category: category.into(),
            weight,
        }
    }

    /// Looks up a category's weight (case-insensitive). First match wins.
    pub fn lookup(priorities: &[PriorityWeight], category: &str) -> Option<f64> {
        priorities
            .iter()
            .find(|p| p.category.eq_ignore_ascii_case(category))
            .map(|p| p.weight)
    }
}
