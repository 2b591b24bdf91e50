//! The individual validation checks.
//!
//! Each check is independent: it reads the input and returns its own
//! findings. Execution order only affects reporting order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::{CoRunGraph, Severity, ValidationError, ValidationType};
use crate::models::{skill_key, BusinessRule, Client, Qualification, RuleKind, Task, Worker};
use crate::normalize::columns::*;
use crate::normalize::{parse_attributes, parse_phases, parse_slots, EntityKind};

pub(super) struct CheckInput<'a> {
    pub clients: &'a [Client],
    pub workers: &'a [Worker],
    pub tasks: &'a [Task],
    /// Active rules, `None` when no rule context was supplied.
    pub rules: Option<Vec<&'a BusinessRule>>,
}

pub(super) fn run(validation_type: ValidationType, input: &CheckInput<'_>) -> Vec<ValidationError> {
    match validation_type {
        ValidationType::MissingColumn => missing_columns(input),
        ValidationType::DuplicateId => duplicate_ids(input),
        ValidationType::MalformedList => malformed_lists(input),
        ValidationType::OutOfRange => out_of_range(input),
        ValidationType::BrokenJson => broken_json(input),
        ValidationType::UnknownReference => unknown_references(input),
        ValidationType::CircularCoRun => match &input.rules {
            Some(rules) => circular_co_run(rules),
            None => Vec::new(),
        },
        ValidationType::ConflictingRules => match &input.rules {
            Some(rules) => conflicting_rules(rules, input.tasks),
            None => Vec::new(),
        },
        ValidationType::OverloadedWorker => overloaded_workers(input),
        ValidationType::PhaseSaturation => phase_saturation(input),
        ValidationType::SkillCoverage => skill_coverage(input),
        ValidationType::MaxConcurrency => max_concurrency(input),
    }
}

/// Uniform view over the three entity kinds.
trait Record {
    const KIND: EntityKind;
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn absent_columns(&self) -> &[String];
}

impl Record for Client {
    const KIND: EntityKind = EntityKind::Client;
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn absent_columns(&self) -> &[String] {
        &self.absent_columns
    }
}

impl Record for Worker {
    const KIND: EntityKind = EntityKind::Worker;
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn absent_columns(&self) -> &[String] {
        &self.absent_columns
    }
}

impl Record for Task {
    const KIND: EntityKind = EntityKind::Task;
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn absent_columns(&self) -> &[String] {
        &self.absent_columns
    }
}

// ======================== 1. Missing columns ========================

fn missing_columns(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let mut out = missing_in(input.clients);
    out.extend(missing_in(input.workers));
    out.extend(missing_in(input.tasks));
    out
}

fn missing_in<R: Record>(records: &[R]) -> Vec<ValidationError> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let absent = first.absent_columns();
    let mut out: Vec<ValidationError> = absent
        .iter()
        .map(|column| {
            ValidationError::new(
                ValidationType::MissingColumn,
                R::KIND,
                None,
                column.as_str(),
                format!("Required column '{column}' is missing from the {} sheet", R::KIND),
            )
            .with_suggestion(format!("Add a '{column}' column"))
        })
        .collect();

    let id_col = R::KIND.id_column();
    let name_col = R::KIND.name_column();
    for (row, record) in records.iter().enumerate() {
        for (column, value) in [(id_col, record.id()), (name_col, record.name())] {
            if value.is_empty() && !absent.iter().any(|a| a == column) {
                out.push(ValidationError::new(
                    ValidationType::MissingColumn,
                    R::KIND,
                    Some(row),
                    column,
                    format!("{column} is empty"),
                ));
            }
        }
    }
    out
}

// ======================== 2. Duplicate IDs ========================

fn duplicate_ids(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let mut out = duplicates_in(input.clients);
    out.extend(duplicates_in(input.workers));
    out.extend(duplicates_in(input.tasks));
    out
}

fn duplicates_in<R: Record>(records: &[R]) -> Vec<ValidationError> {
    let column = R::KIND.id_column();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::new();
    for (row, record) in records.iter().enumerate() {
        let id = record.id();
        if id.is_empty() {
            continue;
        }
        match first_seen.get(id) {
            Some(&first) => out.push(
                ValidationError::new(
                    ValidationType::DuplicateId,
                    R::KIND,
                    Some(row),
                    column,
                    format!("Duplicate {column} '{id}' (first used in row {first})"),
                )
                .with_suggestion(format!("Give row {row} a unique {column}")),
            ),
            None => {
                first_seen.insert(id, row);
            }
        }
    }
    out
}

// ======================== 3. Malformed lists ========================

fn malformed_lists(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let mut out = Vec::new();
    for (row, w) in input.workers.iter().enumerate() {
        if let Err(err) = parse_slots(&w.available_slots_raw) {
            out.push(
                ValidationError::new(
                    ValidationType::MalformedList,
                    EntityKind::Worker,
                    Some(row),
                    AVAILABLE_SLOTS,
                    format!(
                        "AvailableSlots '{}' of worker {} is not a valid integer array: {err}",
                        w.available_slots_raw, w.id
                    ),
                )
                .with_suggestion("Use a JSON array of phase numbers, e.g. [1,2,3]"),
            );
        }
        if w.skills.is_empty() {
            out.push(ValidationError::new(
                ValidationType::MalformedList,
                EntityKind::Worker,
                Some(row),
                SKILLS,
                format!("Worker {} has no skills", w.id),
            ));
        }
    }
    for (row, t) in input.tasks.iter().enumerate() {
        let raw = t.preferred_phases_raw.trim();
        if !raw.is_empty() {
            if let Err(err) = parse_phases(raw) {
                out.push(
                    ValidationError::new(
                        ValidationType::MalformedList,
                        EntityKind::Task,
                        Some(row),
                        PREFERRED_PHASES,
                        format!(
                            "PreferredPhases '{}' of task {} is malformed: {err}",
                            t.preferred_phases_raw, t.id
                        ),
                    )
                    .with_suggestion("Use a range like 1-3 or a JSON array like [1,3]"),
                );
            }
        }
        if t.required_skills.is_empty() {
            out.push(ValidationError::new(
                ValidationType::MalformedList,
                EntityKind::Task,
                Some(row),
                REQUIRED_SKILLS,
                format!("Task {} lists no required skills", t.id),
            ));
        }
    }
    out
}

// ======================== 4. Out-of-range values ========================

fn out_of_range(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let mut out = Vec::new();
    for (row, c) in input.clients.iter().enumerate() {
        if !(1..=5).contains(&c.priority_level) {
            out.push(
                ValidationError::new(
                    ValidationType::OutOfRange,
                    EntityKind::Client,
                    Some(row),
                    PRIORITY_LEVEL,
                    format!(
                        "PriorityLevel {} of client {} is outside 1-5",
                        c.priority_level, c.id
                    ),
                )
                .with_suggestion("Use a priority between 1 and 5"),
            );
        }
    }
    for (row, w) in input.workers.iter().enumerate() {
        match &w.qualification {
            Qualification::Level(level) if !(1..=10).contains(level) => out.push(
                ValidationError::new(
                    ValidationType::OutOfRange,
                    EntityKind::Worker,
                    Some(row),
                    QUALIFICATION_LEVEL,
                    format!("QualificationLevel {level} of worker {} is outside 1-10", w.id),
                )
                .with_severity(Severity::Warning),
            ),
            Qualification::Title(title) if !title.is_empty() && !w.qualification.is_known() => out.push(
                ValidationError::new(
                    ValidationType::OutOfRange,
                    EntityKind::Worker,
                    Some(row),
                    QUALIFICATION_LEVEL,
                    format!(
                        "QualificationLevel '{title}' of worker {} is not a recognized title",
                        w.id
                    ),
                )
                .with_severity(Severity::Info)
                .with_suggestion(
                    "Use 1-10 or one of Junior, Mid-level, Senior, Lead, Principal, Architect",
                ),
            ),
            _ => {}
        }
        if w.max_load_per_phase < 1 {
            out.push(
                ValidationError::new(
                    ValidationType::OutOfRange,
                    EntityKind::Worker,
                    Some(row),
                    MAX_LOAD_PER_PHASE,
                    format!(
                        "MaxLoadPerPhase {} of worker {} is below 1",
                        w.max_load_per_phase, w.id
                    ),
                )
                .with_severity(Severity::Warning),
            );
        }
    }
    for (row, t) in input.tasks.iter().enumerate() {
        if t.duration < 1 {
            out.push(
                ValidationError::new(
                    ValidationType::OutOfRange,
                    EntityKind::Task,
                    Some(row),
                    DURATION,
                    format!("Duration {} of task {} is below 1", t.duration, t.id),
                )
                .with_suggestion("Use a duration of at least 1 phase"),
            );
        }
        if t.max_concurrent < 1 {
            out.push(
                ValidationError::new(
                    ValidationType::OutOfRange,
                    EntityKind::Task,
                    Some(row),
                    MAX_CONCURRENT,
                    format!("MaxConcurrent {} of task {} is below 1", t.max_concurrent, t.id),
                )
                .with_severity(Severity::Warning),
            );
        }
    }
    out
}

// ======================== 5. Broken JSON ========================

fn broken_json(input: &CheckInput<'_>) -> Vec<ValidationError> {
    input
        .clients
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.attributes_raw.trim().is_empty())
        .filter_map(|(row, c)| {
            let err = parse_attributes(&c.attributes_raw).err()?;
            Some(
                ValidationError::new(
                    ValidationType::BrokenJson,
                    EntityKind::Client,
                    Some(row),
                    ATTRIBUTES_JSON,
                    format!("AttributesJSON of client {} does not parse: {err}", c.id),
                )
                .with_suggestion("Provide a JSON object, e.g. {\"key\": \"value\"}"),
            )
        })
        .collect()
}

// ======================== 6. Unknown references ========================

fn unknown_references(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let task_ids: HashSet<&str> = input.tasks.iter().map(|t| t.id.as_str()).collect();
    let mut out = Vec::new();
    for (row, c) in input.clients.iter().enumerate() {
        for requested in &c.requested_task_ids {
            if !task_ids.contains(requested.as_str()) {
                out.push(
                    ValidationError::new(
                        ValidationType::UnknownReference,
                        EntityKind::Client,
                        Some(row),
                        REQUESTED_TASK_IDS,
                        format!("Client {} requests unknown task '{requested}'", c.id),
                    )
                    .with_suggestion(format!("Remove '{requested}' or add it to the tasks sheet")),
                );
            }
        }
    }
    out
}

// ======================== 7. Circular co-run ========================

fn circular_co_run(rules: &[&BusinessRule]) -> Vec<ValidationError> {
    CoRunGraph::from_rules(rules.iter().copied())
        .cycles()
        .into_iter()
        .map(|cycle| {
            ValidationError::new(
                ValidationType::CircularCoRun,
                EntityKind::Task,
                None,
                "co-run",
                format!(
                    "Co-run cycle {} (rules {})",
                    cycle.tasks.join(" -> "),
                    cycle.rule_ids.join(", ")
                ),
            )
            .with_suggestion("Merge or remove one of the co-run rules in the cycle")
        })
        .collect()
}

// ======================== 8. Conflicting rules ========================

fn conflicting_rules(rules: &[&BusinessRule], tasks: &[Task]) -> Vec<ValidationError> {
    let mut windows: BTreeMap<&str, (&str, BTreeSet<u32>)> = BTreeMap::new();
    for rule in rules {
        if let RuleKind::PhaseWindow { task, phases } = &rule.kind {
            windows
                .entry(task.as_str())
                .or_insert_with(|| (rule.id.as_str(), phases.iter().copied().collect()));
        }
    }
    if windows.is_empty() {
        return Vec::new();
    }
    let preferred: HashMap<&str, &[u32]> = tasks
        .iter()
        .map(|t| (t.id.as_str(), t.preferred_phases.as_slice()))
        .collect();

    let mut out = Vec::new();
    // (co-run rule, unordered task pair) already reported
    let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();
    for rule in rules {
        let RuleKind::CoRun { tasks: group } = &rule.kind else {
            continue;
        };
        for restricted in group {
            let Some((window_rule, window)) = windows.get(restricted.as_str()) else {
                continue;
            };
            for partner in group.iter().filter(|p| *p != restricted) {
                let partner_phases: BTreeSet<u32> = match windows.get(partner.as_str()) {
                    Some((_, w)) => w.clone(),
                    None => preferred
                        .get(partner.as_str())
                        .map(|p| p.iter().copied().collect())
                        .unwrap_or_default(),
                };
                if partner_phases.is_empty() || !partner_phases.is_disjoint(window) {
                    continue;
                }
                let pair = if restricted <= partner {
                    (restricted.as_str(), partner.as_str())
                } else {
                    (partner.as_str(), restricted.as_str())
                };
                if seen.insert((rule.id.as_str(), pair.0, pair.1)) {
                    out.push(
                        ValidationError::new(
                            ValidationType::ConflictingRules,
                            EntityKind::Task,
                            None,
                            "phase-window",
                            format!(
                                "Rule {window_rule} limits {restricted} to phases {window:?}, \
                                 but co-run rule {} pairs it with {partner} (phases {partner_phases:?})",
                                rule.id
                            ),
                        )
                        .with_suggestion(format!(
                            "Widen the phase window of {restricted} or drop {partner} from {}",
                            rule.id
                        )),
                    );
                }
            }
        }
    }
    out
}

// ======================== 9. Overloaded workers ========================

fn overloaded_workers(input: &CheckInput<'_>) -> Vec<ValidationError> {
    input
        .workers
        .iter()
        .enumerate()
        .filter(|(_, w)| (w.available_slots.len() as i64) < w.max_load_per_phase)
        .map(|(row, w)| {
            ValidationError::new(
                ValidationType::OverloadedWorker,
                EntityKind::Worker,
                Some(row),
                MAX_LOAD_PER_PHASE,
                format!(
                    "Worker {} has {} available slot(s) but MaxLoadPerPhase {}",
                    w.id,
                    w.available_slots.len(),
                    w.max_load_per_phase
                ),
            )
            .with_severity(Severity::Warning)
            .with_suggestion("Lower MaxLoadPerPhase or add available slots")
        })
        .collect()
}

// ======================== 10. Phase saturation ========================

fn phase_saturation(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let mut demand: BTreeMap<u32, i64> = BTreeMap::new();
    for t in input.tasks {
        let phases: BTreeSet<u32> = t.preferred_phases.iter().copied().collect();
        for phase in phases {
            *demand.entry(phase).or_insert(0) += t.duration;
        }
    }

    let mut capacity: HashMap<u32, i64> = HashMap::new();
    for w in input.workers {
        let slots: BTreeSet<u32> = w.available_slots.iter().copied().collect();
        for slot in slots {
            *capacity.entry(slot).or_insert(0) += w.max_load_per_phase;
        }
    }

    demand
        .into_iter()
        .filter_map(|(phase, needed)| {
            let available = capacity.get(&phase).copied().unwrap_or(0);
            (needed > available).then(|| {
                ValidationError::new(
                    ValidationType::PhaseSaturation,
                    EntityKind::Task,
                    None,
                    PREFERRED_PHASES,
                    format!(
                        "Phase {phase} is saturated: demand {needed} exceeds capacity {available}"
                    ),
                )
                .with_suggestion(format!(
                    "Move tasks out of phase {phase} or add worker availability"
                ))
            })
        })
        .collect()
}

// ======================== 11. Skill coverage ========================

fn skill_coverage(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let held: HashSet<String> = input
        .workers
        .iter()
        .flat_map(|w| w.skills.iter().map(|s| skill_key(s)))
        .collect();

    let mut out = Vec::new();
    for (row, t) in input.tasks.iter().enumerate() {
        let mut reported: HashSet<String> = HashSet::new();
        for skill in &t.required_skills {
            let key = skill_key(skill);
            if !held.contains(&key) && reported.insert(key) {
                out.push(
                    ValidationError::new(
                        ValidationType::SkillCoverage,
                        EntityKind::Task,
                        Some(row),
                        REQUIRED_SKILLS,
                        format!("Task {} requires skill '{skill}' but no worker has it", t.id),
                    )
                    .with_suggestion(format!("Add a worker with '{skill}' or drop the requirement")),
                );
            }
        }
    }
    out
}

// ======================== 12. Max concurrency ========================

fn max_concurrency(input: &CheckInput<'_>) -> Vec<ValidationError> {
    let mut out = Vec::new();
    for (row, t) in input.tasks.iter().enumerate() {
        let qualified = input
            .workers
            .iter()
            .filter(|w| w.has_all_skills(&t.required_skills))
            .count();
        if t.max_concurrent > qualified as i64 {
            out.push(
                ValidationError::new(
                    ValidationType::MaxConcurrency,
                    EntityKind::Task,
                    Some(row),
                    MAX_CONCURRENT,
                    format!(
                        "MaxConcurrent {} of task {} exceeds the {qualified} qualified worker(s)",
                        t.max_concurrent, t.id
                    ),
                )
                .with_severity(Severity::Warning)
                .with_suggestion(format!("Lower MaxConcurrent to {qualified} or below")),
            );
        }
    }
    out
}
