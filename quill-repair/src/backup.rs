//! Named, timestamped pre-repair snapshots. Bounded list, oldest evicted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use quill_core::constants::{keys, MAX_REPAIR_BACKUPS};
use quill_core::errors::QuillResult;
use quill_core::traits::LocalStore;

/// One retained snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub id: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub document: Value,
}

/// Bounded snapshot list persisted through the LocalStore.
pub struct BackupStore {
    store: Arc<dyn LocalStore>,
    snapshots: Mutex<Vec<BackupSnapshot>>,
}

impl BackupStore {
    /// Load the persisted snapshot list, or start empty.
    pub async fn load(store: Arc<dyn LocalStore>) -> QuillResult<Self> {
        let snapshots = match store.get(keys::REPAIR_BACKUPS).await? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            store,
            snapshots: Mutex::new(snapshots),
        })
    }

    /// Snapshot a document. Returns the backup handle (its id).
    pub async fn create(&self, label: &str, document: &Value) -> QuillResult<String> {
        let snapshot = BackupSnapshot {
            id: uuid::Uuid::new_v4().to_string(),
            label: label.to_string(),
            created_at: Utc::now(),
            document: document.clone(),
        };
        let id = snapshot.id.clone();

        let mut snapshots = self.snapshots.lock().await;
        snapshots.push(snapshot);
        if snapshots.len() > MAX_REPAIR_BACKUPS {
            let excess = snapshots.len() - MAX_REPAIR_BACKUPS;
            snapshots.drain(..excess);
        }
        self.store
            .set(keys::REPAIR_BACKUPS, serde_json::to_value(&*snapshots)?)
            .await?;
        tracing::debug!(backup_id = %id, label, "backup created");
        Ok(id)
    }

    /// Fetch a snapshot by handle.
    pub async fn get(&self, id: &str) -> Option<BackupSnapshot> {
        self.snapshots
            .lock()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// All retained snapshots, oldest first.
    pub async fn list(&self) -> Vec<BackupSnapshot> {
        self.snapshots.lock().await.clone()
    }

    /// Number of retained snapshots.
    pub async fn len(&self) -> usize {
        self.snapshots.lock().await.len()
    }

    /// Whether no snapshots are retained.
    pub async fn is_empty(&self) -> bool {
        self.snapshots.lock().await.is_empty()
    }
}
