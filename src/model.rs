//! The todo record and its create/patch payloads.
//!
//! Field names follow the persisted JSON contract: camelCase keys, lowercase
//! priority values, optionals omitted when absent. A stored array written by
//! any other implementation of the same contract reads back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ── Priority ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a user-entered priority name. Case-insensitive.
    pub fn parse(s: &str) -> Option<Priority> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

// ── Todo ───────────────────────────────────────────────────────

/// One todo record — the sole persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Set at creation, immutable after. Optional on read: rows written by
    /// older layouts may miss it or hold garbage, and one bad timestamp must
    /// not poison the whole array. Such rows sort as oldest.
    #[serde(
        default,
        alias = "created_at",
        deserialize_with = "lenient_instant",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Todo {
    /// Sort key: milliseconds since epoch, 0 when createdAt is missing or
    /// was unparseable. Missing-timestamp rows therefore sort oldest.
    pub fn created_ts(&self) -> i64 {
        self.created_at.map(|t| t.timestamp_millis()).unwrap_or(0)
    }
}

/// Accept any JSON shape for createdAt: a valid ISO-8601 string parses, and
/// everything else (wrong type, bad string) reads as None instead of failing
/// the containing array.
fn lenient_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok()))
}

// ── Create / patch payloads ────────────────────────────────────

/// Payload for creating a todo. The id comes from the caller — the store
/// never generates identifiers itself.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub id: Uuid,
    pub title: String,
    pub due: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

impl NewTodo {
    /// Minimal payload: fresh id, medium priority, nothing optional.
    pub fn titled(title: impl Into<String>) -> Self {
        NewTodo {
            id: Uuid::new_v4(),
            title: title.into(),
            due: None,
            priority: Priority::Medium,
            notes: None,
            tags: Vec::new(),
        }
    }
}

/// A shallow patch: `Some` overwrites the field, `None` leaves it alone.
/// The id is not patchable. There is no way to clear an optional field back
/// to absent — matching the merge semantics of the persisted contract.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub due: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl TodoPatch {
    pub fn completed(value: bool) -> Self {
        TodoPatch {
            completed: Some(value),
            ..TodoPatch::default()
        }
    }

    pub fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(due) = self.due {
            todo.due = Some(due);
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(notes) = &self.notes {
            todo.notes = Some(notes.clone());
        }
        if let Some(tags) = &self.tags {
            todo.tags = tags.clone();
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
