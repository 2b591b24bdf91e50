//! Greedy priority-driven allocator.
//!
//! # Algorithm
//!
//! 1. Build the queue: one entry per (client, requested task) pair that
//!    resolves to a known task, scored `priority × speed weight`, stable
//!    sorted descending.
//! 2. For each entry, filter eligible workers (all required skills, at
//!    least one available slot).
//! 3. Order them by the composed rule effects.
//! 4. Keep the first `MaxConcurrent`.
//! 5. Choose the preferred phase where most selected workers are available,
//!    then drop selected workers who are not available in it. With no
//!    preferred phases the default phase is used and nobody is dropped. If
//!    nobody is left the entry stays unassigned with a warning.
//! 6. Score confidence, write the reasoning trail, update utilization.
//!
//! No backtracking: an entry is decided once and never revisited.
//!
//! # Complexity
//! O(q · (w log w + r · w log w)) where q=queue entries, w=workers, r=rules.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::summary::executed_rules;
use super::{AllocationConfig, UtilizationTracking};
use crate::error::InputError;
use crate::interpreter::{
    Adjustment, AdvisedInterpreter, OrderingContext, RuleAdvisor, WorkerOrdering,
};
use crate::models::{
    AllocationResult, AllocationSummary, BusinessRule, Client, PriorityWeight, Task, Worker,
};
use crate::normalize::Dataset;
use crate::validation::{ValidationOutcome, Validator};

/// Average qualification tier at or above which a selection reads as senior.
const SENIOR_TIER: f64 = 6.0;
/// Average qualification tier at or above which a selection reads as mid-level.
const MID_TIER: f64 = 4.0;

/// Everything one allocation run needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub clients: Vec<Client>,
    pub workers: Vec<Worker>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub rules: Vec<BusinessRule>,
    #[serde(default)]
    pub priorities: Vec<PriorityWeight>,
    #[serde(default)]
    pub config: AllocationConfig,
}

impl AllocationRequest {
    /// Creates a request without rules or priorities.
    pub fn new(clients: Vec<Client>, workers: Vec<Worker>, tasks: Vec<Task>) -> Self {
        Self {
            clients,
            workers,
            tasks,
            ..Self::default()
        }
    }

    /// Sets the business rules.
    pub fn with_rules(mut self, rules: Vec<BusinessRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the priority weights.
    pub fn with_priorities(mut self, priorities: Vec<PriorityWeight>) -> Self {
        self.priorities = priorities;
        self
    }

    /// Sets the run configuration.
    pub fn with_config(mut self, config: AllocationConfig) -> Self {
        self.config = config;
        self
    }

    /// Decodes a request whose `clients`, `workers` and `tasks` are arrays of
    /// raw spreadsheet records. `rules`, `priorities` and `config` are
    /// optional typed values.
    pub fn from_json(value: &Value) -> Result<Self, InputError> {
        let dataset = Dataset::from_json(value)?;
        Ok(Self {
            clients: dataset.clients,
            workers: dataset.workers,
            tasks: dataset.tasks,
            rules: optional_field(value, "rules")?,
            priorities: optional_field(value, "priorities")?,
            config: optional_field(value, "config")?,
        })
    }

    /// Validates the request's entities with its rules as context.
    pub fn validate(&self) -> ValidationOutcome {
        Validator::new()
            .with_rules(&self.rules)
            .run(&self.clients, &self.workers, &self.tasks)
    }

    /// Allocates with the request's configuration and no advisor.
    pub fn allocate(&self) -> AllocationSummary {
        Allocator::new().with_config(self.config.clone()).allocate(
            &self.clients,
            &self.workers,
            &self.tasks,
            &self.rules,
            &self.priorities,
        )
    }
}

fn optional_field<T>(value: &Value, field: &'static str) -> Result<T, InputError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match value.get(field) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| InputError::Field {
            field,
            message: e.to_string(),
        }),
    }
}

/// A queued (task, client) pair.
#[derive(Debug, Clone, Copy)]
struct QueueEntry<'d> {
    task: &'d Task,
    client: &'d Client,
    score: f64,
}

/// Greedy allocator.
///
/// # Example
///
/// ```
/// use u_allocate::allocation::Allocator;
/// use u_allocate::models::{Client, Task, Worker};
///
/// let clients = vec![Client::new("C1").with_name("Acme").with_priority(4).with_request("T1")];
/// let workers = vec![Worker::new("W1").with_skill("rust").with_slots([1, 2])];
/// let tasks = vec![Task::new("T1").with_skill("Rust").with_phases([2])];
///
/// let summary = Allocator::new().allocate(&clients, &workers, &tasks, &[], &[]);
/// assert_eq!(summary.assigned_tasks, 1);
/// assert_eq!(summary.allocations[0].worker_ids, vec!["W1"]);
/// assert_eq!(summary.allocations[0].phase, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Allocator<'a> {
    config: AllocationConfig,
    interpreter: AdvisedInterpreter<'a>,
}

impl<'a> Allocator<'a> {
    /// Creates an allocator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the run configuration.
    pub fn with_config(mut self, config: AllocationConfig) -> Self {
        self.config = config;
        self
    }

    /// Classifies rule text with `advisor` before the keyword vocabulary.
    pub fn with_advisor(mut self, advisor: &'a dyn RuleAdvisor) -> Self {
        self.interpreter = self.interpreter.with_advisor(advisor);
        self
    }

    /// Replaces the advisor wrapper (advisor and timeout).
    pub fn with_interpreter(mut self, interpreter: AdvisedInterpreter<'a>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Allocates every requested task.
    ///
    /// Inactive rules are ignored. Requested IDs that match no task are
    /// skipped (validation reports them). Never fails.
    pub fn allocate(
        &self,
        clients: &[Client],
        workers: &[Worker],
        tasks: &[Task],
        rules: &[BusinessRule],
        priorities: &[PriorityWeight],
    ) -> AllocationSummary {
        let ordering = WorkerOrdering::from_rules(rules, &self.interpreter);
        let queue = self.build_queue(clients, tasks, priorities);

        let mut summary = AllocationSummary {
            total_tasks: queue.len(),
            ..AllocationSummary::default()
        };
        let mut context = OrderingContext::new();

        for entry in &queue {
            let task = entry.task;
            let client = entry.client;

            let mut candidates: Vec<&Worker> = workers
                .iter()
                .filter(|w| is_eligible(w, task))
                .collect();
            if candidates.is_empty() {
                let warning = format!(
                    "Task {} requested by client {} has no eligible workers",
                    task.id, client.id
                );
                tracing::warn!(task = %task.id, client = %client.id, "task left unassigned");
                summary.add_unassigned(warning);
                continue;
            }
            let eligible_count = candidates.len();

            context.client_group.clone_from(&client.group_tag);
            let reordered = ordering.order(&mut candidates, &context);

            candidates.truncate(task.concurrency_limit());
            let mut selected = candidates;
            if selected.is_empty() {
                let warning = format!(
                    "Task {} requested by client {} allows no workers (MaxConcurrent {})",
                    task.id, client.id, task.max_concurrent
                );
                tracing::warn!(task = %task.id, client = %client.id, "task left unassigned");
                summary.add_unassigned(warning);
                continue;
            }

            let phase = choose_phase(&task.preferred_phases, &selected, self.config.default_phase);
            let crew_before_phase = selected.len();
            if !task.preferred_phases.is_empty() {
                selected.retain(|w| w.is_available_in(phase));
            }
            if selected.is_empty() {
                let warning = format!(
                    "Task {} requested by client {} has no selected worker available in its \
                     preferred phases {:?}",
                    task.id, client.id, task.preferred_phases
                );
                tracing::warn!(task = %task.id, client = %client.id, "task left unassigned");
                summary.add_unassigned(warning);
                continue;
            }
            let dropped = crew_before_phase - selected.len();

            let confidence = confidence(task, &selected, phase, &context);
            let reasoning = reasoning(
                task,
                client,
                &selected,
                eligible_count,
                dropped,
                phase,
                &reordered,
            );

            if self.config.utilization_tracking == UtilizationTracking::Accumulate {
                for worker in &selected {
                    context.record_load(&worker.id, task.duration);
                }
            }

            tracing::debug!(
                task = %task.id,
                client = %client.id,
                workers = selected.len(),
                phase,
                confidence,
                "task allocated"
            );

            let result = AllocationResult {
                task_id: task.id.clone(),
                task_name: task.name.clone(),
                client_id: client.id.clone(),
                client_name: client.name.clone(),
                worker_ids: selected.iter().map(|w| w.id.clone()).collect(),
                worker_names: selected.iter().map(|w| w.name.clone()).collect(),
                phase,
                priority: client.priority_level,
                reasoning,
                confidence,
            };
            summary.add_result(result, task.duration);
        }

        let active: Vec<&BusinessRule> = rules.iter().filter(|r| r.active).collect();
        summary.rules_executed = executed_rules(active, &summary.allocations);

        tracing::info!(
            total = summary.total_tasks,
            assigned = summary.assigned_tasks,
            unassigned = summary.unassigned_tasks,
            rules_executed = summary.rules_executed.len(),
            "allocation finished"
        );
        summary
    }

    /// Builds the priority queue.
    fn build_queue<'d>(
        &self,
        clients: &'d [Client],
        tasks: &'d [Task],
        priorities: &[PriorityWeight],
    ) -> Vec<QueueEntry<'d>> {
        // First occurrence wins for duplicate task IDs.
        let mut by_id: HashMap<&str, &Task> = HashMap::new();
        for task in tasks {
            by_id.entry(task.id.as_str()).or_insert(task);
        }

        let weight = PriorityWeight::lookup(priorities, &self.config.speed_category)
            .unwrap_or(self.config.default_speed_weight);

        let mut queue: Vec<QueueEntry<'d>> = Vec::new();
        for client in clients {
            let score = client.priority_level as f64 * weight;
            for id in &client.requested_task_ids {
                if let Some(&task) = by_id.get(id.as_str()) {
                    queue.push(QueueEntry {
                        task,
                        client,
                        score,
                    });
                }
            }
        }

        queue.sort_by(|a, b| b.score.total_cmp(&a.score));
        queue
    }
}

/// Allocates with the default configuration and no advisor.
pub fn allocate(
    clients: &[Client],
    workers: &[Worker],
    tasks: &[Task],
    rules: &[BusinessRule],
    priorities: &[PriorityWeight],
) -> AllocationSummary {
    Allocator::new().allocate(clients, workers, tasks, rules, priorities)
}

fn is_eligible(worker: &Worker, task: &Task) -> bool {
    worker.has_all_skills(&task.required_skills) && !worker.available_slots.is_empty()
}

/// Preferred phase with the most selected workers available; ties go to the
/// earliest in preference order. The caller drops whoever is unavailable in
/// the returned phase.
fn choose_phase(preferred: &[u32], selected: &[&Worker], default_phase: u32) -> u32 {
    let mut best: Option<(u32, usize)> = None;
    for &phase in preferred {
        let available = selected.iter().filter(|w| w.is_available_in(phase)).count();
        if best.map_or(true, |(_, count)| available > count) {
            best = Some((phase, available));
        }
    }
    best.map_or(default_phase, |(phase, _)| phase)
}

fn confidence(task: &Task, selected: &[&Worker], phase: u32, context: &OrderingContext) -> f64 {
    let mut score = 0.5;
    if selected.iter().all(|w| w.has_all_skills(&task.required_skills)) {
        score += 0.3;
    }
    if selected.iter().all(|w| w.is_available_in(phase)) {
        score += 0.2;
    }
    if selected
        .iter()
        .all(|w| context.utilization_of(&w.id) + task.duration <= w.max_load_per_phase)
    {
        score += 0.1;
    }
    f64::min(score, 1.0)
}

fn priority_tier(level: i64) -> &'static str {
    match level {
        l if l >= 5 => "critical",
        4 => "high",
        3 => "medium",
        _ => "low",
    }
}

fn qualification_label(average: f64) -> &'static str {
    if average >= SENIOR_TIER {
        "senior"
    } else if average >= MID_TIER {
        "mid-level"
    } else {
        "junior"
    }
}

fn reasoning(
    task: &Task,
    client: &Client,
    selected: &[&Worker],
    eligible_count: usize,
    dropped: usize,
    phase: u32,
    reordered: &[Adjustment<'_>],
) -> String {
    let mut sentences = Vec::new();

    if task.required_skills.is_empty() {
        sentences.push(format!("Task {} requires no specific skills.", task.id));
    } else {
        sentences.push(format!(
            "All selected workers hold the required skills ({}).",
            task.required_skills.join(", ")
        ));
    }

    sentences.push(format!(
        "Client {} has {} priority (level {}).",
        client.id,
        priority_tier(client.priority_level),
        client.priority_level
    ));

    let crew = selected.len() + dropped;
    if crew < eligible_count {
        sentences.push(format!(
            "Crew of {} capped by MaxConcurrent {} out of {} eligible.",
            crew, task.max_concurrent, eligible_count
        ));
    } else {
        sentences.push(format!(
            "Crew of {} uses every eligible worker (MaxConcurrent {}).",
            crew, task.max_concurrent
        ));
    }
    if dropped > 0 {
        sentences.push(format!(
            "Released {dropped} worker(s) not available in phase {phase}."
        ));
    }

    let tiers: Vec<f64> = selected
        .iter()
        .filter_map(|w| w.qualification.tier())
        .collect();
    if tiers.is_empty() {
        sentences.push("Qualification of the selection is unknown.".to_string());
    } else {
        let average = tiers.iter().sum::<f64>() / tiers.len() as f64;
        sentences.push(format!(
            "Average qualification {average:.1} ({}).",
            qualification_label(average)
        ));
    }

    for adjustment in reordered {
        sentences.push(format!(
            "Ordering adjusted by rule {} ({}).",
            adjustment.rule_id, adjustment.keyword
        ));
    }

    if task.preferred_phases.contains(&phase) {
        sentences.push(format!("Scheduled in preferred phase {phase}."));
    } else {
        sentences.push(format!("Scheduled in default phase {phase}."));
    }

    sentences.join(" ")
}
