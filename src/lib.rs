//! Workforce allocation framework for the U-Engine ecosystem.
//!
//! Validates three related tabular entity sets (clients, workers, tasks) and
//! allocates workers to requested tasks across discrete time phases, shaped
//! by free-text business rules.
//!
//! # Modules
//!
//! - **`normalize`**: Raw string records → typed entities (list, range and
//!   JSON cell parsers)
//! - **`models`**: Domain types: `Client`, `Worker`, `Task`, `BusinessRule`,
//!   `PriorityWeight`, `AllocationResult`, `AllocationSummary`
//! - **`validation`**: Twelve integrity checks (duplicate IDs, references,
//!   co-run cycles, phase saturation, skill coverage, ...)
//! - **`interpreter`**: Rule text → worker-ordering effects, with an optional
//!   external advisor behind a timeout-and-fallback contract
//! - **`allocation`**: Greedy priority-driven allocator and run KPIs
//! - **`error`**: Error types
//!
//! # Architecture
//!
//! Both engines are pure, synchronous functions over in-memory data. They
//! collect findings and warnings instead of failing on bad rows; only an
//! invalid overall input shape is an error.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Cormen et al. (2009), "Introduction to Algorithms"

pub mod allocation;
pub mod error;
pub mod interpreter;
pub mod models;
pub mod normalize;
pub mod validation;
