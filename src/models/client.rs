//! Client model.
//!
//! A client requests tasks and carries the priority used to order the
//! allocation queue.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::parse_attributes;

/// A client requesting one or more tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Priority level, valid range 1..=5 (higher = more important).
    pub priority_level: i64,
    /// Requested task IDs, in the order listed.
    pub requested_task_ids: Vec<String>,
    /// Group tag, matched against worker groups by group-affinity rules.
    pub group_tag: String,
    /// Parsed attributes (empty if the raw text is not a JSON object).
    pub attributes: Map<String, Value>,
    /// Raw attributes text as ingested.
    pub attributes_raw: String,
    /// Required columns missing from the source record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absent_columns: Vec<String>,
}

impl Client {
    /// Creates a client with priority 1 and no requests.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            priority_level: 1,
            requested_task_ids: Vec::new(),
            group_tag: String::new(),
            attributes: Map::new(),
            attributes_raw: "{}".to_string(),
            absent_columns: Vec::new(),
        }
    }

    /// Sets the client name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the priority level.
    pub fn with_priority(mut self, priority_level: i64) -> Self {
        self.priority_level = priority_level;
        self
    }

    /// Appends a requested task ID.
    pub fn with_request(mut self, task_id: impl Into<String>) -> Self {
        self.requested_task_ids.push(task_id.into());
        self
    }

    /// Sets the group tag.
    pub fn with_group(mut self, group_tag: impl Into<String>) -> Self {
        self.group_tag = group_tag.into();
        self
    }

    /// Sets attributes from raw JSON text.
    ///
    /// Unparseable text leaves the parsed map empty.
    pub fn with_attributes_json(mut self, raw: impl Into<String>) -> Self {
        self.attributes_raw = raw.into();
        self.attributes = parse_attributes(&self.attributes_raw).unwrap_or_default();
        self
    }

    /// Whether this client requests the given task.
    pub fn requests(&self, task_id: &str) -> bool {
        self.requested_task_ids.iter().any(|t| t == task_id)
    }
}
