//! Allocation engine.
//!
//! Assigns eligible workers to requested tasks, one queue entry at a time,
//! in descending client priority. Business rules shape which eligible
//! workers are preferred; see [`crate::interpreter`].
//!
//! # Components
//!
//! - [`Allocator`]: the greedy allocation loop
//! - [`AllocationConfig`]: run tunables (speed category, default phase,
//!   utilization mode)
//! - [`AllocationRequest`]: serializable bundle of all run inputs
//! - [`AllocationKpi`]: quality indicators of a finished run
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

mod config;
mod engine;
mod summary;

pub use config::{AllocationConfig, UtilizationTracking};
pub use engine::{allocate, AllocationRequest, Allocator};
pub use summary::{executed_rules, AllocationKpi};

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;
    use crate::models::{BusinessRule, Client, Qualification, Task, Worker};
    use crate::validation::Validator;

    const SKILLS: [&str; 3] = ["rust", "SQL", "go"];
    const GROUPS: [&str; 3] = ["", "Blue", "Red"];
    const RULES: [&str; 5] = [
        "Prefer senior staff",
        "Balance the load",
        "Stay within budget",
        "Keep the client group together",
        "No deploys on Friday",
    ];

    fn workers() -> impl Strategy<Value = Vec<Worker>> {
        prop::collection::vec(
            (
                prop::collection::vec(0..SKILLS.len(), 0..3),
                prop::collection::vec(1u32..5, 0..4),
                0i64..4,
                1i64..11,
                0..GROUPS.len(),
            ),
            0..6,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (skills, slots, load, level, group))| {
                    skills.into_iter().fold(
                        Worker::new(format!("W{i}"))
                            .with_slots(slots)
                            .with_max_load(load)
                            .with_group(GROUPS[group])
                            .with_qualification(Qualification::Level(level)),
                        |w, s| w.with_skill(SKILLS[s].to_lowercase()),
                    )
                })
                .collect()
        })
    }

    fn tasks() -> impl Strategy<Value = Vec<Task>> {
        prop::collection::vec(
            (
                prop::collection::vec(0..SKILLS.len(), 0..3),
                prop::collection::vec(1u32..5, 0..3),
                0i64..3,
                -1i64..4,
            ),
            0..5,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (skills, phases, duration, max_concurrent))| {
                    skills.into_iter().fold(
                        Task::new(format!("T{i}"))
                            .with_phases(phases)
                            .with_duration(duration)
                            .with_max_concurrent(max_concurrent),
                        |t, s| t.with_skill(SKILLS[s]),
                    )
                })
                .collect()
        })
    }

    fn clients() -> impl Strategy<Value = Vec<Client>> {
        prop::collection::vec(
            (0i64..7, prop::collection::vec(0usize..7, 0..4), 0..GROUPS.len()),
            0..4,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (priority, requests, group))| {
                    requests.into_iter().fold(
                        Client::new(format!("C{i}"))
                            .with_priority(priority)
                            .with_group(GROUPS[group]),
                        |c, t| c.with_request(format!("T{t}")),
                    )
                })
                .collect()
        })
    }

    fn rules() -> impl Strategy<Value = Vec<BusinessRule>> {
        prop::collection::vec((0..RULES.len(), any::<bool>()), 0..4).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (text, active))| {
                    let rule = BusinessRule::new(format!("R{i}"), RULES[text]);
                    if active {
                        rule
                    } else {
                        rule.inactive()
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn property_allocation_is_deterministic(
            c in clients(), w in workers(), t in tasks(), r in rules()
        ) {
            prop_assert_eq!(allocate(&c, &w, &t, &r, &[]), allocate(&c, &w, &t, &r, &[]));
        }

        #[test]
        fn property_selection_respects_capacity_and_eligibility(
            c in clients(), w in workers(), t in tasks(), r in rules()
        ) {
            let summary = allocate(&c, &w, &t, &r, &[]);
            prop_assert_eq!(summary.assigned_tasks + summary.unassigned_tasks, summary.total_tasks);
            for result in &summary.allocations {
                let task = t.iter().find(|x| x.id == result.task_id).unwrap();
                prop_assert!(!result.worker_ids.is_empty());
                prop_assert!(result.worker_ids.len() <= task.concurrency_limit());
                for id in &result.worker_ids {
                    let worker = w.iter().find(|x| &x.id == id).unwrap();
                    prop_assert!(worker.has_all_skills(&task.required_skills));
                    prop_assert!(!worker.available_slots.is_empty());
                }
                prop_assert!((0.0..=1.0).contains(&result.confidence));
            }
        }

        #[test]
        fn property_phase_is_preferred_or_default(
            c in clients(), w in workers(), t in tasks(), default_phase in 1u32..9
        ) {
            let summary = Allocator::new()
                .with_config(AllocationConfig::new().with_default_phase(default_phase))
                .allocate(&c, &w, &t, &[], &[]);
            for result in &summary.allocations {
                let task = t.iter().find(|x| x.id == result.task_id).unwrap();
                if task.preferred_phases.is_empty() {
                    prop_assert_eq!(result.phase, default_phase);
                } else {
                    prop_assert!(task.preferred_phases.contains(&result.phase));
                }
            }
        }

        #[test]
        fn property_workers_available_in_preferred_phase(
            c in clients(), w in workers(), t in tasks(), r in rules()
        ) {
            let summary = allocate(&c, &w, &t, &r, &[]);
            for result in &summary.allocations {
                let task = t.iter().find(|x| x.id == result.task_id).unwrap();
                if task.preferred_phases.is_empty() {
                    continue;
                }
                for id in &result.worker_ids {
                    let worker = w.iter().find(|x| &x.id == id).unwrap();
                    prop_assert!(
                        worker.is_available_in(result.phase),
                        "worker {} not available in phase {}", id, result.phase
                    );
                }
            }
        }

        #[test]
        fn property_validation_is_idempotent(
            c in clients(), w in workers(), t in tasks(), r in rules()
        ) {
            let validator = Validator::new().with_rules(&r);
            prop_assert_eq!(validator.run(&c, &w, &t), validator.run(&c, &w, &t));
        }
    }
}
