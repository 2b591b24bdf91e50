//! Business rules.
//!
//! A rule has a free-text description, a classification with its structured
//! payload, and an active flag. Rules are produced outside this crate (from
//! natural-language input or by direct construction) and only ever change
//! through [`RuleBook`] lifecycle calls. The engines read them, never write.

use serde::{Deserialize, Serialize};

use crate::error::RuleBookError;

/// Rule classification and payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RuleKind {
    /// Listed tasks must be scheduled together.
    CoRun { tasks: Vec<String> },

    /// Workers of `group` must share at least `min_common_slots` phases.
    SlotRestriction { group: String, min_common_slots: u32 },

    /// Workers of `group` take at most `max_slots_per_phase` units per phase.
    LoadLimit {
        group: String,
        max_slots_per_phase: u32,
    },

    /// `task` may only run in `phases`.
    PhaseWindow { task: String, phases: Vec<u32> },

    /// Records whose text matches `pattern` are handled per `template`.
    PatternMatch { pattern: String, template: String },

    /// Explicit rule precedence, highest first.
    PrecedenceOverride { order: Vec<String> },

    /// No structured payload; effect comes from the description alone.
    Custom,
}

impl RuleKind {
    /// Classification tag as used on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CoRun { .. } => "co-run",
            Self::SlotRestriction { .. } => "slot-restriction",
            Self::LoadLimit { .. } => "load-limit",
            Self::PhaseWindow { .. } => "phase-window",
            Self::PatternMatch { .. } => "pattern-match",
            Self::PrecedenceOverride { .. } => "precedence-override",
            Self::Custom => "custom",
        }
    }
}

/// A business rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRule {
    /// Unique rule identifier.
    pub id: String,
    /// Free-text description.
    pub description: String,
    /// Classification and payload.
    pub kind: RuleKind,
    /// Rule priority (higher = more important).
    #[serde(default)]
    pub priority: i32,
    /// Inactive rules are ignored by both engines.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl BusinessRule {
    /// Creates an active custom rule.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind: RuleKind::Custom,
            priority: 0,
            active: true,
        }
    }

    /// Creates an active co-run rule over `tasks`.
    pub fn co_run<I, S>(id: impl Into<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tasks: Vec<String> = tasks.into_iter().map(Into::into).collect();
        let description = format!("Run tasks {} together", tasks.join(", "));
        Self::new(id, description).with_kind(RuleKind::CoRun { tasks })
    }

    /// Creates an active phase-window rule.
    pub fn phase_window(
        id: impl Into<String>,
        task: impl Into<String>,
        phases: impl IntoIterator<Item = u32>,
    ) -> Self {
        let task = task.into();
        let phases: Vec<u32> = phases.into_iter().collect();
        let description = format!("Restrict task {task} to phases {phases:?}");
        Self::new(id, description).with_kind(RuleKind::PhaseWindow { task, phases })
    }

    /// Sets the classification and payload.
    pub fn with_kind(mut self, kind: RuleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the rule priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the rule inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// An ordered collection of rules with lifecycle operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleBook {
    rules: Vec<BusinessRule>,
}

impl RuleBook {
    /// Creates an empty rule book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. IDs must be unique.
    pub fn add(&mut self, rule: BusinessRule) -> Result<(), RuleBookError> {
        if self.get(&rule.id).is_some() {
            return Err(RuleBookError::DuplicateId(rule.id));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Looks up a rule by ID.
    pub fn get(&self, id: &str) -> Option<&BusinessRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Activates a rule.
    pub fn activate(&mut self, id: &str) -> Result<(), RuleBookError> {
        self.set_active(id, true)
    }

    /// Deactivates a rule.
    pub fn deactivate(&mut self, id: &str) -> Result<(), RuleBookError> {
        self.set_active(id, false)
    }

    /// Removes a rule and returns it.
    pub fn remove(&mut self, id: &str) -> Result<BusinessRule, RuleBookError> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RuleBookError::NotFound(id.to_string()))?;
        Ok(self.rules.remove(pos))
    }

    /// All rules, in insertion order.
    pub fn rules(&self) -> &[BusinessRule] {
        &self.rules
    }

    /// Active rules, in insertion order.
    pub fn active(&self) -> impl Iterator<Item = &BusinessRule> {
        self.rules.iter().filter(|r| r.active)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn set_active(&mut self, id: &str, active: bool) -> Result<(), RuleBookError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RuleBookError::NotFound(id.to_string()))?;
        rule.active = active;
        Ok(())
    }
}

impl FromIterator<BusinessRule> for RuleBook {
    /// Collects rules; later duplicates of an ID are dropped.
    fn from_iter<I: IntoIterator<Item = BusinessRule>>(iter: I) -> Self {
        let mut book = Self::new();
        for rule in iter {
            let _ = book.add(rule);
        }
        book
    }
}
