//! Entity normalizer.
//!
//! Converts raw string-keyed records (one per spreadsheet row) into typed
//! [`Client`], [`Worker`] and [`Task`] values. List-valued cells become
//! ordered sequences and JSON cells become parsed structures.
//!
//! Normalization never fails on cell contents. A cell that cannot be parsed
//! yields an empty value and its raw text is kept on the entity so the
//! validation engine can diagnose it later.
//!
//! The only fatal condition is a malformed *overall* shape, reported by
//! [`Dataset::from_json`] as an [`InputError`].

mod parsers;

pub use parsers::{parse_attributes, parse_phases, parse_slots, split_list};
pub(crate) use parsers::parse_int;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::InputError;
use crate::models::{Client, Qualification, Task, Worker};

/// A raw record: column name → cell text, as produced by file ingestion.
pub type RawRecord = BTreeMap<String, String>;

/// Column names of the three input sheets.
pub mod columns {
    pub const CLIENT_ID: &str = "ClientID";
    pub const CLIENT_NAME: &str = "ClientName";
    pub const PRIORITY_LEVEL: &str = "PriorityLevel";
    pub const REQUESTED_TASK_IDS: &str = "RequestedTaskIDs";
    pub const GROUP_TAG: &str = "GroupTag";
    pub const ATTRIBUTES_JSON: &str = "AttributesJSON";

    pub const WORKER_ID: &str = "WorkerID";
    pub const WORKER_NAME: &str = "WorkerName";
    pub const SKILLS: &str = "Skills";
    pub const AVAILABLE_SLOTS: &str = "AvailableSlots";
    pub const MAX_LOAD_PER_PHASE: &str = "MaxLoadPerPhase";
    pub const WORKER_GROUP: &str = "WorkerGroup";
    pub const QUALIFICATION_LEVEL: &str = "QualificationLevel";

    pub const TASK_ID: &str = "TaskID";
    pub const TASK_NAME: &str = "TaskName";
    pub const CATEGORY: &str = "Category";
    pub const DURATION: &str = "Duration";
    pub const REQUIRED_SKILLS: &str = "RequiredSkills";
    pub const PREFERRED_PHASES: &str = "PreferredPhases";
    pub const MAX_CONCURRENT: &str = "MaxConcurrent";
}

use columns::*;

/// The three entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Client,
    Worker,
    Task,
}

impl EntityKind {
    /// All kinds, in sheet order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Client, EntityKind::Worker, EntityKind::Task];

    /// Collection name used in JSON input and messages.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Client => "clients",
            Self::Worker => "workers",
            Self::Task => "tasks",
        }
    }

    /// Primary key column.
    pub fn id_column(self) -> &'static str {
        match self {
            Self::Client => CLIENT_ID,
            Self::Worker => WORKER_ID,
            Self::Task => TASK_ID,
        }
    }

    /// Display-name column.
    pub fn name_column(self) -> &'static str {
        match self {
            Self::Client => CLIENT_NAME,
            Self::Worker => WORKER_NAME,
            Self::Task => TASK_NAME,
        }
    }

    /// The fixed column set every record of this kind must carry.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Client => &[
                CLIENT_ID,
                CLIENT_NAME,
                PRIORITY_LEVEL,
                REQUESTED_TASK_IDS,
                GROUP_TAG,
                ATTRIBUTES_JSON,
            ],
            Self::Worker => &[
                WORKER_ID,
                WORKER_NAME,
                SKILLS,
                AVAILABLE_SLOTS,
                MAX_LOAD_PER_PHASE,
                WORKER_GROUP,
                QUALIFICATION_LEVEL,
            ],
            Self::Task => &[
                TASK_ID,
                TASK_NAME,
                CATEGORY,
                DURATION,
                REQUIRED_SKILLS,
                PREFERRED_PHASES,
                MAX_CONCURRENT,
            ],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

fn cell<'a>(raw: &'a RawRecord, column: &str) -> &'a str {
    raw.get(column).map(String::as_str).unwrap_or("")
}

fn absent_columns(raw: &RawRecord, kind: EntityKind) -> Vec<String> {
    kind.required_columns()
        .iter()
        .filter(|c| !raw.contains_key(**c))
        .map(|c| c.to_string())
        .collect()
}

/// Normalizes one client row.
pub fn normalize_client(raw: &RawRecord) -> Client {
    let attributes_raw = cell(raw, ATTRIBUTES_JSON).to_string();
    Client {
        id: cell(raw, CLIENT_ID).trim().to_string(),
        name: cell(raw, CLIENT_NAME).trim().to_string(),
        priority_level: parse_int(cell(raw, PRIORITY_LEVEL)).unwrap_or(0),
        requested_task_ids: split_list(cell(raw, REQUESTED_TASK_IDS)),
        group_tag: cell(raw, GROUP_TAG).trim().to_string(),
        attributes: parse_attributes(&attributes_raw).unwrap_or_default(),
        attributes_raw,
        absent_columns: absent_columns(raw, EntityKind::Client),
    }
}

/// Normalizes one worker row.
pub fn normalize_worker(raw: &RawRecord) -> Worker {
    let available_slots_raw = cell(raw, AVAILABLE_SLOTS).to_string();
    Worker {
        id: cell(raw, WORKER_ID).trim().to_string(),
        name: cell(raw, WORKER_NAME).trim().to_string(),
        skills: split_list(cell(raw, SKILLS)),
        available_slots: parse_slots(&available_slots_raw).unwrap_or_default(),
        available_slots_raw,
        max_load_per_phase: parse_int(cell(raw, MAX_LOAD_PER_PHASE)).unwrap_or(0),
        group: cell(raw, WORKER_GROUP).trim().to_string(),
        qualification: Qualification::parse(cell(raw, QUALIFICATION_LEVEL)),
        absent_columns: absent_columns(raw, EntityKind::Worker),
    }
}

/// Normalizes one task row.
pub fn normalize_task(raw: &RawRecord) -> Task {
    let preferred_phases_raw = cell(raw, PREFERRED_PHASES).to_string();
    Task {
        id: cell(raw, TASK_ID).trim().to_string(),
        name: cell(raw, TASK_NAME).trim().to_string(),
        category: cell(raw, CATEGORY).trim().to_string(),
        duration: parse_int(cell(raw, DURATION)).unwrap_or(0),
        required_skills: split_list(cell(raw, REQUIRED_SKILLS)),
        preferred_phases: parse_phases(&preferred_phases_raw).unwrap_or_default(),
        preferred_phases_raw,
        max_concurrent: parse_int(cell(raw, MAX_CONCURRENT)).unwrap_or(0),
        absent_columns: absent_columns(raw, EntityKind::Task),
    }
}

/// The three normalized collections, in file row order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub clients: Vec<Client>,
    pub workers: Vec<Worker>,
    pub tasks: Vec<Task>,
}

impl Dataset {
    /// Normalizes raw records of all three kinds.
    pub fn from_records(clients: &[RawRecord], workers: &[RawRecord], tasks: &[RawRecord]) -> Self {
        Self {
            clients: clients.iter().map(normalize_client).collect(),
            workers: workers.iter().map(normalize_worker).collect(),
            tasks: tasks.iter().map(normalize_task).collect(),
        }
    }

    /// Decodes `{"clients": [...], "workers": [...], "tasks": [...]}`.
    ///
    /// Each row must be a JSON object; cell values may be strings, numbers,
    /// booleans, null, or nested JSON (kept as JSON text).
    pub fn from_json(value: &Value) -> Result<Self, InputError> {
        let clients = records_from_json(value, EntityKind::Client)?;
        let workers = records_from_json(value, EntityKind::Worker)?;
        let tasks = records_from_json(value, EntityKind::Task)?;
        Ok(Self::from_records(&clients, &workers, &tasks))
    }
}

/// Extracts one entity collection from a top-level JSON object.
pub fn records_from_json(value: &Value, kind: EntityKind) -> Result<Vec<RawRecord>, InputError> {
    let object = value.as_object().ok_or(InputError::NotAnObject)?;
    let rows = object
        .get(kind.collection())
        .ok_or(InputError::MissingCollection(kind))?
        .as_array()
        .ok_or(InputError::NotAnArray(kind))?;

    rows.iter()
        .enumerate()
        .map(|(row, item)| -> Result<RawRecord, InputError> {
            let fields = item
                .as_object()
                .ok_or(InputError::NotARecord { kind, row })?;
            Ok(fields
                .iter()
                .map(|(k, v)| (k.clone(), cell_text(v)))
                .collect())
        })
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_client() {
        let raw = record(&[
            (CLIENT_ID, " C1 "),
            (CLIENT_NAME, "Acme"),
            (PRIORITY_LEVEL, "4"),
            (REQUESTED_TASK_IDS, "T1, T2,,T1"),
            (GROUP_TAG, "GroupA"),
            (ATTRIBUTES_JSON, r#"{"budget": 100}"#),
        ]);
        let c = normalize_client(&raw);
        assert_eq!(c.id, "C1");
        assert_eq!(c.priority_level, 4);
        assert_eq!(c.requested_task_ids, vec!["T1", "T2", "T1"]);
        assert_eq!(c.attributes.get("budget"), Some(&json!(100)));
        assert!(c.absent_columns.is_empty());
    }

    #[test]
    fn test_normalize_worker_bad_slots_degrade_to_empty() {
        let raw = record(&[
            (WORKER_ID, "W1"),
            (WORKER_NAME, "Ana"),
            (SKILLS, "rust, sql"),
            (AVAILABLE_SLOTS, "[1, 2"),
            (MAX_LOAD_PER_PHASE, "2"),
            (WORKER_GROUP, "Team1"),
            (QUALIFICATION_LEVEL, "Senior"),
        ]);
        let w = normalize_worker(&raw);
        assert!(w.available_slots.is_empty());
        assert_eq!(w.available_slots_raw, "[1, 2");
        assert_eq!(w.skills, vec!["rust", "sql"]);
        assert_eq!(w.qualification, Qualification::Title("Senior".into()));
    }

    #[test]
    fn test_normalize_task_range_and_missing_columns() {
        let raw = record(&[
            (TASK_ID, "T1"),
            (TASK_NAME, "Build"),
            (DURATION, "2"),
            (REQUIRED_SKILLS, "rust"),
            (PREFERRED_PHASES, "1-3"),
        ]);
        let t = normalize_task(&raw);
        assert_eq!(t.preferred_phases, vec![1, 2, 3]);
        assert_eq!(t.max_concurrent, 0);
        assert_eq!(t.absent_columns, vec![CATEGORY, MAX_CONCURRENT]);
    }

    #[test]
    fn test_dataset_from_json() {
        let input = json!({
            "clients": [{"ClientID": "C1", "PriorityLevel": 3, "RequestedTaskIDs": "T1"}],
            "workers": [{"WorkerID": "W1", "AvailableSlots": [1, 2], "MaxLoadPerPhase": 2}],
            "tasks": [{"TaskID": "T1", "Duration": 1, "PreferredPhases": null}]
        });
        let ds = Dataset::from_json(&input).unwrap();
        assert_eq!(ds.clients[0].priority_level, 3);
        assert_eq!(ds.workers[0].available_slots, vec![1, 2]);
        assert!(ds.tasks[0].preferred_phases.is_empty());
    }

    #[test]
    fn test_dataset_from_json_shape_errors() {
        assert_eq!(
            Dataset::from_json(&json!([])).unwrap_err(),
            InputError::NotAnObject
        );
        assert_eq!(
            Dataset::from_json(&json!({"clients": [], "workers": []})).unwrap_err(),
            InputError::MissingCollection(EntityKind::Task)
        );
        assert_eq!(
            Dataset::from_json(&json!({"clients": {}, "workers": [], "tasks": []})).unwrap_err(),
            InputError::NotAnArray(EntityKind::Client)
        );
        assert_eq!(
            Dataset::from_json(&json!({"clients": [], "workers": [1], "tasks": []})).unwrap_err(),
            InputError::NotARecord {
                kind: EntityKind::Worker,
                row: 0
            }
        );
    }
}
