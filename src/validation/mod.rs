//! Validation engine.
//!
//! Checks structural and cross-referential integrity of clients, workers,
//! and tasks before allocation. Runs a fixed battery of independent checks
//! and collects every finding; a malformed row never stops the run.
//!
//! # Checks (in reporting order)
//!
//! 1. Missing required columns (and empty ID/name values)
//! 2. Duplicate IDs
//! 3. Malformed lists (`AvailableSlots`, `PreferredPhases`, skill lists)
//! 4. Out-of-range values
//! 5. Broken JSON (`AttributesJSON`)
//! 6. Unknown task references
//! 7. Circular co-run groups (needs rules)
//! 8. Co-run rules conflicting with phase windows (needs rules)
//! 9. Overloaded workers
//! 10. Phase-slot saturation
//! 11. Skill coverage
//! 12. Max-concurrency feasibility
//!
//! Checks 7 and 8 pass vacuously when no rule context is given.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3 (DFS, back edges)

mod checks;
mod corun;

pub use corun::{CoRunCycle, CoRunGraph};

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::interpreter::{AdvisedInterpreter, RuleAdvisor};
use crate::models::{BusinessRule, Client, Task, Worker};
use crate::normalize::EntityKind;

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks correctness; should gate allocation and export.
    Error,
    /// Structurally valid but risky.
    Warning,
    /// Advisory only.
    Info,
}

/// Closed set of validation types, one per check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationType {
    MissingColumn,
    DuplicateId,
    MalformedList,
    OutOfRange,
    BrokenJson,
    UnknownReference,
    CircularCoRun,
    ConflictingRules,
    OverloadedWorker,
    PhaseSaturation,
    SkillCoverage,
    MaxConcurrency,
}

impl ValidationType {
    /// All types, in check execution order.
    pub const ALL: [ValidationType; 12] = [
        ValidationType::MissingColumn,
        ValidationType::DuplicateId,
        ValidationType::MalformedList,
        ValidationType::OutOfRange,
        ValidationType::BrokenJson,
        ValidationType::UnknownReference,
        ValidationType::CircularCoRun,
        ValidationType::ConflictingRules,
        ValidationType::OverloadedWorker,
        ValidationType::PhaseSaturation,
        ValidationType::SkillCoverage,
        ValidationType::MaxConcurrency,
    ];

    /// Name of the check producing this type, as listed in
    /// `passed`/`failed`.
    pub fn check_name(self) -> &'static str {
        match self {
            Self::MissingColumn => "Missing Required Columns",
            Self::DuplicateId => "Duplicate IDs",
            Self::MalformedList => "Malformed Lists",
            Self::OutOfRange => "Out-of-Range Values",
            Self::BrokenJson => "Broken JSON",
            Self::UnknownReference => "Unknown References",
            Self::CircularCoRun => "Circular Co-Run Groups",
            Self::ConflictingRules => "Conflicting Rules",
            Self::OverloadedWorker => "Overloaded Workers",
            Self::PhaseSaturation => "Phase-Slot Saturation",
            Self::SkillCoverage => "Skill Coverage",
            Self::MaxConcurrency => "Max-Concurrency Feasibility",
        }
    }

    /// Whether the check needs rule context.
    pub fn needs_rules(self) -> bool {
        matches!(self, Self::CircularCoRun | Self::ConflictingRules)
    }
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.check_name())
    }
}

/// A single validation finding.
///
/// Findings are values: a new run produces new findings, existing ones are
/// never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Sheet the finding refers to.
    pub entity: EntityKind,
    /// Row index, `None` for sheet-level findings (serialized as `-1`).
    #[serde(with = "row_index")]
    pub row: Option<usize>,
    /// Column name.
    pub column: String,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Suggested fix, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Check that produced the finding.
    pub validation_type: ValidationType,
}

impl ValidationError {
    /// Creates an error-severity finding.
    pub fn new(
        validation_type: ValidationType,
        entity: EntityKind,
        row: Option<usize>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            row,
            column: column.into(),
            message: message.into(),
            severity: Severity::Error,
            suggestion: None,
            validation_type,
        }
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Whether the finding blocks correctness.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

mod row_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(row: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match row {
            Some(r) => s.serialize_i64(*r as i64),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(d)?;
        Ok(usize::try_from(raw).ok())
    }
}

/// Findings of one run plus per-check pass/fail lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// All findings, grouped by check in execution order.
    pub errors: Vec<ValidationError>,
    /// Names of checks that produced no finding.
    pub passed: Vec<String>,
    /// Names of checks that produced at least one finding.
    pub failed: Vec<String>,
}

impl ValidationOutcome {
    /// Number of findings with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.errors.iter().filter(|e| e.severity == severity).count()
    }

    /// Whether any error-severity finding exists.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(ValidationError::is_error)
    }

    /// Findings of one type.
    pub fn of_type(&self, validation_type: ValidationType) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.validation_type == validation_type)
            .collect()
    }

    /// Builds the caller-facing report, stamped with the current time.
    pub fn report(&self) -> ValidationReport {
        self.report_at(OffsetDateTime::now_utc())
    }

    /// Builds the report with an explicit timestamp.
    pub fn report_at(&self, last_run: OffsetDateTime) -> ValidationReport {
        ValidationReport {
            total_errors: self.count(Severity::Error),
            total_warnings: self.count(Severity::Warning),
            total_info: self.count(Severity::Info),
            passed_validations: self.passed.clone(),
            failed_validations: self.failed.clone(),
            validations_passed: !self.has_errors(),
            last_run,
            errors: self.errors.clone(),
        }
    }
}

/// Validation summary as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub total_errors: usize,
    pub total_warnings: usize,
    pub total_info: usize,
    pub passed_validations: Vec<String>,
    pub failed_validations: Vec<String>,
    /// `true` iff there are no error-severity findings.
    pub validations_passed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_run: OffsetDateTime,
    pub errors: Vec<ValidationError>,
}

/// Configurable validation run.
///
/// # Example
/// ```
/// use u_allocate::models::{BusinessRule, Client, Task, Worker};
/// use u_allocate::validation::Validator;
///
/// let rules = vec![BusinessRule::co_run("R1", ["T1", "T2"])];
/// let tasks = vec![Task::new("T1").with_name("A").with_skill("rust")];
/// let outcome = Validator::new().with_rules(&rules).run(&[], &[], &tasks);
/// assert!(outcome.has_errors()); // nobody holds "rust"
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator<'a> {
    rules: Option<&'a [BusinessRule]>,
    interpreter: AdvisedInterpreter<'a>,
}

impl<'a> Validator<'a> {
    /// Creates a validator without rule context or advisor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies rule context for the co-run and conflict checks.
    /// Inactive rules are ignored.
    pub fn with_rules(mut self, rules: &'a [BusinessRule]) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Asks `advisor` for suggestions on findings that have none.
    pub fn with_advisor(mut self, advisor: &'a dyn RuleAdvisor) -> Self {
        self.interpreter = self.interpreter.with_advisor(advisor);
        self
    }

    /// Replaces the advisor wrapper (advisor and timeout).
    pub fn with_interpreter(mut self, interpreter: AdvisedInterpreter<'a>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Runs every check.
    pub fn run(&self, clients: &[Client], workers: &[Worker], tasks: &[Task]) -> ValidationOutcome {
        let input = checks::CheckInput {
            clients,
            workers,
            tasks,
            rules: self
                .rules
                .map(|rules| rules.iter().filter(|r| r.active).collect()),
        };

        let mut outcome = ValidationOutcome::default();
        for validation_type in ValidationType::ALL {
            let findings = checks::run(validation_type, &input);
            let name = validation_type.check_name().to_string();
            if findings.is_empty() {
                outcome.passed.push(name);
            } else {
                tracing::debug!(
                    check = validation_type.check_name(),
                    findings = findings.len(),
                    "validation check failed"
                );
                outcome.failed.push(name);
                outcome.errors.extend(findings);
            }
        }

        if self.interpreter.has_advisor() {
            let mut session = self.interpreter.session();
            for finding in outcome.errors.iter_mut().filter(|e| e.suggestion.is_none()) {
                if !session.has_budget() {
                    break;
                }
                finding.suggestion = session.suggest(finding);
            }
        }

        tracing::info!(
            errors = outcome.count(Severity::Error),
            warnings = outcome.count(Severity::Warning),
            info = outcome.count(Severity::Info),
            failed_checks = outcome.failed.len(),
            "validation finished"
        );
        outcome
    }
}

/// Validates without rule context.
pub fn validate(clients: &[Client], workers: &[Worker], tasks: &[Task]) -> ValidationOutcome {
    Validator::new().run(clients, workers, tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Qualification, RuleKind};

    fn sample_clients() -> Vec<Client> {
        vec![
            Client::new("C1")
                .with_name("Acme")
                .with_priority(5)
                .with_request("T1")
                .with_request("T2")
                .with_group("GroupA"),
            Client::new("C2")
                .with_name("Globex")
                .with_priority(2)
                .with_request("T2")
                .with_attributes_json(r#"{"region":"EU"}"#),
        ]
    }

    fn sample_workers() -> Vec<Worker> {
        vec![
            Worker::new("W1")
                .with_name("Ana")
                .with_skill("rust")
                .with_skill("sql")
                .with_slots([1, 2, 3])
                .with_max_load(2)
                .with_group("GroupA")
                .with_qualification(Qualification::Level(7)),
            Worker::new("W2")
                .with_name("Ben")
                .with_skill("sql")
                .with_slots([2, 3])
                .with_max_load(2)
                .with_qualification(Qualification::Title("Junior".into())),
        ]
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task::new("T1")
                .with_name("Build API")
                .with_duration(1)
                .with_skill("rust")
                .with_phases([1, 2]),
            Task::new("T2")
                .with_name("Reports")
                .with_duration(2)
                .with_skill("SQL")
                .with_phases([2, 3])
                .with_max_concurrent(2),
        ]
    }

    fn only(outcome: &ValidationOutcome, t: ValidationType) -> Vec<&ValidationError> {
        outcome.of_type(t)
    }

    #[test]
    fn test_valid_input() {
        let outcome = validate(&sample_clients(), &sample_workers(), &sample_tasks());
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(outcome.passed.len(), 12);
        assert!(outcome.failed.is_empty());
        assert!(outcome.report().validations_passed);
    }

    #[test]
    fn test_scenario_priority_out_of_range() {
        let mut clients = sample_clients();
        clients[0].priority_level = 8;
        let outcome = validate(&clients, &sample_workers(), &sample_tasks());
        assert_eq!(outcome.errors.len(), 1);
        let e = &outcome.errors[0];
        assert_eq!(e.validation_type, ValidationType::OutOfRange);
        assert_eq!(e.column, "PriorityLevel");
        assert_eq!(e.row, Some(0));
        assert!(e.is_error());
    }

    #[test]
    fn test_scenario_unknown_reference() {
        let mut clients = sample_clients();
        clients[1] = clients[1].clone().with_request("T999");
        let outcome = validate(&clients, &sample_workers(), &sample_tasks());
        assert_eq!(outcome.errors.len(), 1);
        let e = &outcome.errors[0];
        assert_eq!(e.validation_type, ValidationType::UnknownReference);
        assert!(e.message.contains("T999"));
        assert_eq!(e.row, Some(1));
    }

    #[test]
    fn test_scenario_uncovered_skill() {
        let mut tasks = sample_tasks();
        tasks.push(
            Task::new("T3")
                .with_name("Port")
                .with_skill("Go")
                .with_phases([1]),
        );
        let outcome = validate(&sample_clients(), &sample_workers(), &tasks);
        let coverage = only(&outcome, ValidationType::SkillCoverage);
        assert_eq!(coverage.len(), 1);
        assert_eq!(coverage[0].row, Some(2));
        assert!(coverage[0].message.contains("Go"));
    }

    #[test]
    fn test_scenario_duplicate_worker_id() {
        let mut workers = sample_workers();
        workers[1].id = "W1".into();
        let outcome = validate(&sample_clients(), &workers, &sample_tasks());
        let dups = only(&outcome, ValidationType::DuplicateId);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].row, Some(1));
        assert_eq!(dups[0].entity, EntityKind::Worker);
    }

    #[test]
    fn test_scenario_max_concurrency() {
        let mut tasks = sample_tasks();
        tasks[1].max_concurrent = 5;
        let outcome = validate(&sample_clients(), &sample_workers(), &tasks);
        let mc = only(&outcome, ValidationType::MaxConcurrency);
        assert_eq!(mc.len(), 1);
        assert_eq!(mc[0].severity, Severity::Warning);
        assert!(mc[0].message.contains('5') && mc[0].message.contains('2'));
        assert!(!outcome.has_errors());
    }

    #[test]
    fn test_rule_checks_pass_vacuously_without_rules() {
        let outcome = validate(&sample_clients(), &sample_workers(), &sample_tasks());
        assert!(outcome
            .passed
            .contains(&ValidationType::CircularCoRun.check_name().to_string()));
        assert!(outcome
            .passed
            .contains(&ValidationType::ConflictingRules.check_name().to_string()));
    }

    #[test]
    fn test_circular_co_run_with_rules() {
        let rules = vec![
            BusinessRule::co_run("R1", ["T1", "T2"]),
            BusinessRule::co_run("R2", ["T2", "T1"]),
        ];
        let outcome = Validator::new()
            .with_rules(&rules)
            .run(&sample_clients(), &sample_workers(), &sample_tasks());
        let cycles = only(&outcome, ValidationType::CircularCoRun);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].message.contains("R1") && cycles[0].message.contains("R2"));
        assert!(outcome
            .failed
            .contains(&ValidationType::CircularCoRun.check_name().to_string()));
    }

    #[test]
    fn test_inactive_rules_ignored() {
        let rules = vec![
            BusinessRule::co_run("R1", ["T1", "T2"]),
            BusinessRule::co_run("R2", ["T2", "T1"]).inactive(),
        ];
        let outcome = Validator::new()
            .with_rules(&rules)
            .run(&sample_clients(), &sample_workers(), &sample_tasks());
        assert!(only(&outcome, ValidationType::CircularCoRun).is_empty());
    }

    #[test]
    fn test_conflicting_phase_window() {
        // T1 limited to phase 1; T2 prefers 2-3 and must co-run with T1.
        let rules = vec![
            BusinessRule::phase_window("R1", "T1", [1]),
            BusinessRule::new("R2", "T1 and T2 together").with_kind(RuleKind::CoRun {
                tasks: vec!["T1".into(), "T2".into()],
            }),
        ];
        let outcome = Validator::new()
            .with_rules(&rules)
            .run(&sample_clients(), &sample_workers(), &sample_tasks());
        let conflicts = only(&outcome, ValidationType::ConflictingRules);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("T2"));
    }

    #[test]
    fn test_idempotent() {
        let mut workers = sample_workers();
        workers[0].available_slots_raw = "[1,".into();
        let a = validate(&sample_clients(), &workers, &sample_tasks());
        let b = validate(&sample_clients(), &workers, &sample_tasks());
        assert_eq!(a, b);
        assert!(!a.errors.is_empty());
    }

    #[test]
    fn test_report_counts_and_shape() {
        let mut tasks = sample_tasks();
        tasks[1].max_concurrent = 5;
        tasks[0].duration = 0;
        let outcome = validate(&sample_clients(), &sample_workers(), &tasks);
        let report = outcome.report();
        assert_eq!(report.total_errors, 1);
        assert_eq!(report.total_warnings, 1);
        assert!(!report.validations_passed);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalErrors"], 1);
        assert!(json["lastRun"].is_string());
        assert_eq!(json["errors"][0]["validationType"], "out-of-range");
        assert_eq!(json["errors"][0]["severity"], "error");
    }

    #[test]
    fn test_sheet_level_row_serializes_as_minus_one() {
        let e = ValidationError::new(
            ValidationType::PhaseSaturation,
            EntityKind::Task,
            None,
            "PreferredPhases",
            "Phase 1 saturated",
        );
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["row"], -1);
        let back: ValidationError = serde_json::from_value(json).unwrap();
        assert_eq!(back.row, None);
    }

    struct SlowSuggester {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl RuleAdvisor for SlowSuggester {
        fn classify(
            &self,
            description: &str,
            _: std::time::Duration,
        ) -> Result<crate::interpreter::RuleEffect, crate::error::AdvisorError> {
            Ok(crate::interpreter::interpret(description))
        }

        fn suggest_correction(
            &self,
            finding: &ValidationError,
            _: std::time::Duration,
        ) -> Result<Option<String>, crate::error::AdvisorError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Some(format!("fix {}", finding.column)))
        }
    }

    #[test]
    fn test_advisor_suggestions_capped_by_run_budget() {
        // nameless, skill-less workers: two unsuggested findings each
        let workers: Vec<Worker> = (0..10).map(|i| Worker::new(format!("W{i}"))).collect();
        let advisor = SlowSuggester {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let interpreter = AdvisedInterpreter::new()
            .with_advisor(&advisor)
            .with_run_budget(std::time::Duration::from_millis(50));
        let outcome = Validator::new()
            .with_interpreter(interpreter)
            .run(&[], &workers, &[]);

        let calls = advisor.calls.load(std::sync::atomic::Ordering::SeqCst);
        assert!((1..=3).contains(&calls), "{calls} advisor calls");
        let unsuggested = outcome.errors.iter().filter(|e| e.suggestion.is_none()).count();
        assert!(unsuggested >= 17);
    }
}
