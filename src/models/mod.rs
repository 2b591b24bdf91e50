//! Domain models.
//!
//! The three input entities (clients, workers, tasks), business rules,
//! priority weights, and the allocation output.
//!
//! # Entity Relations
//!
//! | Entity | References | Referenced by |
//! |--------|-----------|---------------|
//! | Client | Task (`requested_task_ids`) | |
//! | Worker | | Task (via skills) |
//! | Task | Worker skills | Client, co-run and phase-window rules |

mod allocation;
mod client;
mod priority;
mod rule;
mod task;
mod worker;

pub use allocation::{AllocationResult, AllocationSummary};
pub use client::Client;
pub use priority::PriorityWeight;
pub use rule::{BusinessRule, RuleBook, RuleKind};
pub use task::Task;
pub use worker::{skill_key, Qualification, Worker, QUALIFICATION_TITLES};
