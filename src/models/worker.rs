//! Worker model.
//!
//! Workers perform tasks. Each worker has a skill set, the phases in which
//! it can be scheduled, a per-phase load limit, a group, and a
//! qualification level.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::{parse_int, parse_slots};

/// Qualification titles accepted in place of a numeric level, with the
/// numeric tier each one stands for.
pub const QUALIFICATION_TITLES: [(&str, f64); 6] = [
    ("Junior", 2.0),
    ("Mid-level", 4.0),
    ("Senior", 6.0),
    ("Lead", 7.0),
    ("Principal", 8.0),
    ("Architect", 9.0),
];

/// A worker that can be assigned to tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    /// Unique worker identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Skill tags.
    pub skills: Vec<String>,
    /// Phases in which the worker can be scheduled.
    pub available_slots: Vec<u32>,
    /// Raw `AvailableSlots` text as ingested.
    pub available_slots_raw: String,
    /// Maximum duration units the worker may take on per phase.
    pub max_load_per_phase: i64,
    /// Worker group.
    pub group: String,
    /// Qualification level.
    pub qualification: Qualification,
    /// Required columns missing from the source record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absent_columns: Vec<String>,
}

/// Qualification: a numeric level (1..=10) or a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Qualification {
    Level(i64),
    Title(String),
}

impl Worker {
    /// Creates a worker with load limit 1, level 1, and no slots.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            skills: Vec::new(),
            available_slots: Vec::new(),
            available_slots_raw: "[]".to_string(),
            max_load_per_phase: 1,
            group: String::new(),
            qualification: Qualification::Level(1),
            absent_columns: Vec::new(),
        }
    }

    /// Sets the worker name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    /// Sets the available phases.
    pub fn with_slots(mut self, slots: impl IntoIterator<Item = u32>) -> Self {
        self.available_slots = slots.into_iter().collect();
        self.available_slots_raw = format!(
            "[{}]",
            self.available_slots
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")
        );
        self
    }

    /// Sets the available phases from raw cell text.
    pub fn with_slots_raw(mut self, raw: impl Into<String>) -> Self {
        self.available_slots_raw = raw.into();
        self.available_slots = parse_slots(&self.available_slots_raw).unwrap_or_default();
        self
    }

    /// Sets the per-phase load limit.
    pub fn with_max_load(mut self, max_load_per_phase: i64) -> Self {
        self.max_load_per_phase = max_load_per_phase;
        self
    }

    /// Sets the worker group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Sets the qualification.
    pub fn with_qualification(mut self, qualification: Qualification) -> Self {
        self.qualification = qualification;
        self
    }

    /// Whether this worker holds a skill (case-insensitive, Unicode-aware).
    pub fn has_skill(&self, name: &str) -> bool {
        let key = skill_key(name);
        self.skills.iter().any(|s| skill_key(s) == key)
    }

    /// Whether this worker holds every listed skill.
    pub fn has_all_skills(&self, required: &[String]) -> bool {
        required.iter().all(|s| self.has_skill(s))
    }

    /// Whether this worker can be scheduled in `phase`.
    pub fn is_available_in(&self, phase: u32) -> bool {
        self.available_slots.contains(&phase)
    }
}

/// Comparison key for skill tags. Every skill match goes through it.
pub fn skill_key(name: &str) -> String {
    name.to_lowercase()
}

impl Qualification {
    /// Parses a `QualificationLevel` cell: integer if it parses, title otherwise.
    pub fn parse(raw: &str) -> Self {
        match parse_int(raw) {
            Some(level) => Self::Level(level),
            None => Self::Title(raw.trim().to_string()),
        }
    }

    /// Numeric tier used for ordering and averaging.
    ///
    /// Levels map to themselves; known titles map through
    /// [`QUALIFICATION_TITLES`]; unknown titles have no tier.
    pub fn tier(&self) -> Option<f64> {
        match self {
            Self::Level(level) => Some(*level as f64),
            Self::Title(title) => QUALIFICATION_TITLES
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(title))
                .map(|(_, tier)| *tier),
        }
    }

    /// Whether a title belongs to the fixed vocabulary. Levels always do.
    pub fn is_known(&self) -> bool {
        self.tier().is_some()
    }
}

impl fmt::Display for Qualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::Title(title) => f.write_str(title),
        }
    }
}
