//! Durable, mergeable log of not-yet-uploaded local mutations.
//!
//! The queue holds at most one entry per `(entity_kind, entity_id)`.
//! Each append merges into any existing entry so that applying the
//! reduced queue to a base snapshot equals applying the original
//! operations in order.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;

use quill_core::constants::keys;
use quill_core::errors::QuillResult;
use quill_core::model::{ChangeCounts, ChangeType, Document, PendingChange};
use quill_core::traits::LocalStore;

/// Merge an incoming change into the entry list.
///
/// Merge table (existing -> incoming -> result):
/// create+update = create (data replaced), create+delete = removed,
/// update+update = update (data replaced), update+delete = delete,
/// delete+create = create (recreate), none+any = appended as-is.
pub fn merge_into(entries: &mut Vec<PendingChange>, incoming: PendingChange) {
    let Some(pos) = entries.iter().position(|e| e.key() == incoming.key()) else {
        entries.push(incoming);
        return;
    };

    let existing = &entries[pos];
    match (existing.change_type, incoming.change_type) {
        (ChangeType::Create, ChangeType::Delete) => {
            // The record never reached the remote; net no-op.
            entries.remove(pos);
        }
        (ChangeType::Create, ChangeType::Update) => {
            let slot = &mut entries[pos];
            slot.data = incoming.data;
            slot.timestamp = incoming.timestamp;
            // Stays a create: the remote has never seen this id.
        }
        (ChangeType::Delete, ChangeType::Create) => {
            entries[pos] = incoming; // Recreate.
        }
        _ => {
            entries[pos] = incoming;
        }
    }
}

/// Apply a reduced entry list onto a base document, counting what changed.
pub fn apply_entries(document: &mut Document, entries: &[PendingChange]) -> QuillResult<ChangeCounts> {
    let mut counts = ChangeCounts::default();
    for change in entries {
        match change.change_type {
            ChangeType::Create | ChangeType::Update => {
                let data = change.data.clone().unwrap_or_else(|| json!({}));
                let existed = document.contains(change.entity_kind, &change.entity_id);
                document.upsert(change.entity_kind, &data)?;
                if existed {
                    counts.updated += 1;
                } else {
                    counts.added += 1;
                }
            }
            ChangeType::Delete => {
                if document.remove(change.entity_kind, &change.entity_id) {
                    counts.deleted += 1;
                }
            }
        }
    }
    Ok(counts)
}

/// The durable queue. All mutation happens inside one async mutex, so the
/// read-merge-write cycle is an atomic section and concurrent callers
/// serialize.
pub struct PendingChangeQueue {
    store: Arc<dyn LocalStore>,
    entries: Mutex<Vec<PendingChange>>,
}

impl PendingChangeQueue {
    /// Load the persisted queue, or start empty.
    pub async fn load(store: Arc<dyn LocalStore>) -> QuillResult<Self> {
        let entries = match store.get(keys::PENDING_CHANGES).await? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            store,
            entries: Mutex::new(entries),
        })
    }

    /// Merge a change in and persist the reduced queue.
    pub async fn append(&self, change: PendingChange) -> QuillResult<()> {
        let mut entries = self.entries.lock().await;
        merge_into(&mut entries, change);
        self.persist(&entries).await
    }

    /// Number of queued entries.
    pub async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether anything is waiting to upload.
    pub async fn has_pending(&self) -> bool {
        !self.entries.lock().await.is_empty()
    }

    /// Snapshot the current entries.
    pub async fn snapshot(&self) -> Vec<PendingChange> {
        self.entries.lock().await.clone()
    }

    /// Drop all entries and persist the empty queue. Called only after a
    /// successful push; failures leave the queue untouched.
    pub async fn clear(&self) -> QuillResult<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries).await
    }

    async fn persist(&self, entries: &[PendingChange]) -> QuillResult<()> {
        self.store
            .set(keys::PENDING_CHANGES, serde_json::to_value(entries)?)
            .await
    }
}
