//! Append-only sync history, bounded to the most recent entries.

use std::sync::Arc;

use tokio::sync::Mutex;

use quill_core::constants::{keys, MAX_SYNC_HISTORY_ENTRIES};
use quill_core::errors::QuillResult;
use quill_core::model::SyncHistoryEntry;
use quill_core::traits::LocalStore;

/// Bounded history persisted through the LocalStore. Oldest entries are
/// evicted past [`MAX_SYNC_HISTORY_ENTRIES`].
pub struct SyncHistory {
    store: Arc<dyn LocalStore>,
    entries: Mutex<Vec<SyncHistoryEntry>>,
}

impl SyncHistory {
    /// Load the persisted history, or start empty.
    pub async fn load(store: Arc<dyn LocalStore>) -> QuillResult<Self> {
        let entries = match store.get(keys::SYNC_HISTORY).await? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            store,
            entries: Mutex::new(entries),
        })
    }

    /// Append an entry, evicting the oldest past the cap.
    pub async fn record(&self, entry: SyncHistoryEntry) -> QuillResult<()> {
        let mut entries = self.entries.lock().await;
        entries.push(entry);
        if entries.len() > MAX_SYNC_HISTORY_ENTRIES {
            let excess = entries.len() - MAX_SYNC_HISTORY_ENTRIES;
            entries.drain(..excess);
        }
        self.store
            .set(keys::SYNC_HISTORY, serde_json::to_value(&*entries)?)
            .await
    }

    /// The most recent `n` entries, newest first.
    pub async fn recent(&self, n: usize) -> Vec<SyncHistoryEntry> {
        let entries = self.entries.lock().await;
        entries.iter().rev().take(n).cloned().collect()
    }

    /// Total entries currently retained.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether no entries are retained.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Count of failed entries currently retained.
    pub async fn failure_count(&self) -> usize {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| !e.success)
            .count()
    }
}
