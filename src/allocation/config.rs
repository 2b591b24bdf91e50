//! Allocation run configuration.

use serde::{Deserialize, Serialize};

/// How the per-worker utilization counter behaves during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationTracking {
    /// Add each task's duration to every selected worker after allocation.
    #[default]
    Accumulate,
    /// Never update the counter; balance ordering and the load bonus see
    /// zero for everyone.
    Frozen,
}

/// Tunables of an allocation run.
///
/// Every field has a default, so `{}` deserializes to [`AllocationConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationConfig {
    /// Priority category whose weight scales the queue score.
    pub speed_category: String,
    /// Weight used when the category is absent from the priorities.
    pub default_speed_weight: f64,
    /// Phase used for tasks without preferred phases.
    pub default_phase: u32,
    /// Utilization counter mode.
    pub utilization_tracking: UtilizationTracking,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            speed_category: "Speed".to_string(),
            default_speed_weight: 0.5,
            default_phase: 1,
            utilization_tracking: UtilizationTracking::Accumulate,
        }
    }
}

impl AllocationConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the speed category name.
    pub fn with_speed_category(mut self, category: impl Into<String>) -> Self {
        self.speed_category = category.into();
        self
    }

    /// Sets the fallback speed weight.
    pub fn with_default_speed_weight(mut self, weight: f64) -> Self {
        self.default_speed_weight = weight;
        self
    }

    /// Sets the fallback phase.
    pub fn with_default_phase(mut self, phase: u32) -> Self {
        self.default_phase = phase;
        self
    }

    /// Sets the utilization counter mode.
    pub fn with_utilization_tracking(mut self, mode: UtilizationTracking) -> Self {
        self.utilization_tracking = mode;
        self
    }
}
