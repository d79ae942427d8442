//! Pending changes — locally queued, not-yet-uploaded mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::EntityKind;

/// Kind of a local mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

/// A single queued mutation. The queue holds at most one entry per
/// `(entity_kind, entity_id)` — it is a merge-reduced log, not a raw
/// event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    /// Serialized record for create/update; absent for delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl PendingChange {
    pub fn create(kind: EntityKind, id: impl Into<String>, data: Value) -> Self {
        Self {
            change_type: ChangeType::Create,
            entity_kind: kind,
            entity_id: id.into(),
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    pub fn update(kind: EntityKind, id: impl Into<String>, data: Value) -> Self {
        Self {
            change_type: ChangeType::Update,
            entity_kind: kind,
            entity_id: id.into(),
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    pub fn delete(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Delete,
            entity_kind: kind,
            entity_id: id.into(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    /// The queue key this change merges under.
    pub fn key(&self) -> (EntityKind, &str) {
        (self.entity_kind, self.entity_id.as_str())
    }
}
