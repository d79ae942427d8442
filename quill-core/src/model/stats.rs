//! Derived statistics, comparison results, and the bounded sync history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::EntityKind;

/// Per-kind counts plus the newest modification timestamp.
/// Derived from a document snapshot, never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataStatistics {
    pub counts: HashMap<EntityKind, usize>,
    #[serde(rename = "lastModified")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl DataStatistics {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// What the comparator suggests doing next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRecommendation {
    Pull,
    Push,
    Merge,
    Skip,
}

/// Outcome of comparing a local document against remote statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub local: DataStatistics,
    pub remote: DataStatistics,
    /// `remote count - local count` per kind; positive means the remote
    /// holds more records.
    pub differences: HashMap<EntityKind, i64>,
    #[serde(rename = "hasChanges")]
    pub has_changes: bool,
    pub recommendation: SyncRecommendation,
}

/// Counts of records touched by a sync operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.added + self.updated + self.deleted
    }
}

/// Which operation produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncHistoryType {
    Push,
    Pull,
    Bidirectional,
    RepairSync,
}

/// One entry in the append-only, bounded sync history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: SyncHistoryType,
    pub success: bool,
    pub changes: ChangeCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncHistoryEntry {
    pub fn success(entry_type: SyncHistoryType, changes: ChangeCounts) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            entry_type,
            success: true,
            changes,
            error: None,
        }
    }

    pub fn failure(entry_type: SyncHistoryType, error: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            entry_type,
            success: false,
            changes: ChangeCounts::default(),
            error: Some(error.into()),
        }
    }
}
