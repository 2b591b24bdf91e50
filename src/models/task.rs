//! Task model.
//!
//! A task is a unit of work requested by clients. It consumes `duration`
//! phase units, needs workers holding all of its required skills, and may
//! be worked by up to `max_concurrent` workers at once.

use serde::{Deserialize, Serialize};

use crate::normalize::parse_phases;

/// A task to be allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Task category (free text, used for grouping).
    pub category: String,
    /// Phase units consumed (>= 1).
    pub duration: i64,
    /// Skills every assigned worker must hold.
    pub required_skills: Vec<String>,
    /// Preferred phases, in preference order. Empty = no preference.
    pub preferred_phases: Vec<u32>,
    /// Raw `PreferredPhases` text as ingested.
    pub preferred_phases_raw: String,
    /// Maximum number of workers assigned simultaneously (>= 1).
    pub max_concurrent: i64,
    /// Required columns missing from the source record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absent_columns: Vec<String>,
}

impl Task {
    /// Creates a task with duration 1 and a concurrency limit of 1.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            category: String::new(),
            duration: 1,
            required_skills: Vec::new(),
            preferred_phases: Vec::new(),
            preferred_phases_raw: "[]".to_string(),
            max_concurrent: 1,
            absent_columns: Vec::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the task category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the duration in phase units.
    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    /// Adds a required skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    /// Sets the preferred phases.
    pub fn with_phases(mut self, phases: impl IntoIterator<Item = u32>) -> Self {
        self.preferred_phases = phases.into_iter().collect();
        self.preferred_phases_raw = format!(
            "[{}]",
            self.preferred_phases
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")
        );
        self
    }

    /// Sets the preferred phases from raw cell text (`"[1,2]"` or `"1-3"`).
    pub fn with_phases_raw(mut self, raw: impl Into<String>) -> Self {
        self.preferred_phases_raw = raw.into();
        self.preferred_phases = parse_phases(&self.preferred_phases_raw).unwrap_or_default();
        self
    }

    /// Sets the concurrency limit.
    pub fn with_max_concurrent(mut self, max_concurrent: i64) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Concurrency limit as a count; non-positive limits allow nobody.
    pub fn concurrency_limit(&self) -> usize {
        usize::try_from(self.max_concurrent).unwrap_or(0)
    }
}
