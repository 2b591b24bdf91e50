//! Error types.
//!
//! The engines report data-quality problems as findings, not errors. The
//! types here cover the few places where a `Result` is the right shape:
//! field parsers, top-level input decoding, rule lifecycle, and the
//! external rule advisor.

use crate::normalize::EntityKind;

/// Failure parsing a list-valued or JSON-valued cell.
///
/// Only the validation engine inspects these; the normalizer always
/// falls back to an empty value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),
    /// Valid JSON, but not an array.
    #[error("expected a JSON array")]
    NotAnArray,
    /// Valid JSON, but not an object.
    #[error("expected a JSON object")]
    NotAnObject,
    /// An array element is not an integer.
    #[error("element {0} is not an integer")]
    NotAnInteger(String),
    /// An array element is zero or negative.
    #[error("element {0} is not a positive integer")]
    NonPositive(i64),
    /// A range string is not of the form `a-b`.
    #[error("malformed range '{0}'")]
    BadRange(String),
    /// A range whose start exceeds its end.
    #[error("range start {start} exceeds end {end}")]
    InvertedRange { start: u32, end: u32 },
}

/// The overall input has the wrong shape. Fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The top-level value is not a JSON object.
    #[error("input must be a JSON object")]
    NotAnObject,
    /// A required entity collection is absent.
    #[error("missing {0} collection")]
    MissingCollection(EntityKind),
    /// An entity collection is present but is not an array.
    #[error("{0} collection must be an array")]
    NotAnArray(EntityKind),
    /// A row inside a collection is not an object.
    #[error("{kind} row {row} must be an object")]
    NotARecord { kind: EntityKind, row: usize },
    /// A non-entity field (rules, priorities, config) failed to decode.
    #[error("invalid {field}: {message}")]
    Field { field: &'static str, message: String },
}

/// Rule lifecycle failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleBookError {
    #[error("rule '{0}' not found")]
    NotFound(String),
    #[error("rule '{0}' already exists")]
    DuplicateId(String),
}

/// Failures reported by an external rule advisor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvisorError {
    /// The collaborator is not reachable.
    #[error("advisor unavailable: {0}")]
    Unavailable(String),
    /// The collaborator refused the request because of rate limiting.
    #[error("advisor rate limited")]
    RateLimited,
    /// The collaborator answered after the allowed budget.
    #[error("advisor timed out after {0} ms")]
    Timeout(u128),
    /// The collaborator answered with something unusable.
    #[error("advisor returned an invalid response: {0}")]
    InvalidResponse(String),
}
