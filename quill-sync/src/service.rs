//! SyncService — the facade building push / pull / bidirectional sync out
//! of the queue, comparator, and conflict resolver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use quill_core::constants::keys;
use quill_core::errors::{QuillError, QuillResult};
use quill_core::model::{
    ChangeCounts, ComparisonResult, DataStatistics, Document, PendingChange, SyncHistoryEntry,
    SyncHistoryType,
};
use quill_core::traits::{
    AccessMode, LocalStore, PermissionGate, RemoteDocumentClient, RemoteHandle, VersionInfo,
};

use crate::comparator;
use crate::conflict::{self, MergeStrategy};
use crate::history::SyncHistory;
use crate::queue::{self, PendingChangeQueue};
use crate::status::{SyncStatus, SyncStatusCell};

/// How a push ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushOutcome {
    /// A new remote version was written.
    Uploaded,
    /// Outgoing content was identical to the last pushed payload; no
    /// remote write performed, reported as success.
    NoopIdentical,
    /// Caller is in read-only mode; nothing was done.
    SkippedReadOnly,
}

/// Result of a push operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushReport {
    pub outcome: PushOutcome,
    pub changes: ChangeCounts,
    /// Version written by this push, when a remote write happened.
    pub version: Option<VersionInfo>,
}

impl PushReport {
    fn skipped() -> Self {
        Self {
            outcome: PushOutcome::SkippedReadOnly,
            changes: ChangeCounts::default(),
            version: None,
        }
    }
}

/// Result of a bidirectional sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidirectionalReport {
    /// Records touched by the pull (or merge) phase.
    pub pulled: ChangeCounts,
    pub push: PushReport,
    /// Whether a conflict was detected and smart-merged between phases.
    pub merged: bool,
    pub strategy: Option<MergeStrategy>,
}

/// The sync facade. All I/O goes through the injected collaborators;
/// overlap control lives one level up in the coordinator.
pub struct SyncService {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteDocumentClient>,
    gate: Arc<dyn PermissionGate>,
    queue: PendingChangeQueue,
    history: SyncHistory,
    status: SyncStatusCell,
}

/// Hash of the four entity collections, excluding metadata, so that two
/// pushes of the same content compare equal regardless of sync timestamps.
fn content_hash(document: &Document) -> QuillResult<String> {
    let content = serde_json::to_vec(&json!([
        document.resources,
        document.questions,
        document.sub_questions,
        document.answers,
    ]))?;
    Ok(blake3::hash(&content).to_hex().to_string())
}

impl SyncService {
    /// Build the service, loading the durable queue and history.
    pub async fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteDocumentClient>,
        gate: Arc<dyn PermissionGate>,
    ) -> QuillResult<Self> {
        let queue = PendingChangeQueue::load(store.clone()).await?;
        let history = SyncHistory::load(store.clone()).await?;
        Ok(Self {
            store,
            remote,
            gate,
            queue,
            history,
            status: SyncStatusCell::new(),
        })
    }

    /// Current status.
    pub fn status(&self) -> SyncStatus {
        self.status.get()
    }

    /// Subscribe to status transitions.
    pub fn subscribe_status(&self) -> tokio::sync::watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// The durable pending change queue.
    pub fn queue(&self) -> &PendingChangeQueue {
        &self.queue
    }

    /// The bounded sync history.
    pub fn history(&self) -> &SyncHistory {
        &self.history
    }

    /// Queue a local mutation. No-op (returns `false`) outside
    /// write-enabled mode.
    pub async fn add_pending_change(&self, change: PendingChange) -> QuillResult<bool> {
        if self.gate.current_mode() != AccessMode::WriteEnabled {
            tracing::debug!(
                entity_id = %change.entity_id,
                "pending change ignored: read-only mode"
            );
            return Ok(false);
        }
        self.queue.append(change).await?;
        Ok(true)
    }

    // --- Document persistence ---

    /// Assemble the local document from its namespaced keys.
    pub async fn load_document(&self) -> QuillResult<Document> {
        async fn load_list<T: serde::de::DeserializeOwned>(
            store: &Arc<dyn LocalStore>,
            key: &str,
        ) -> QuillResult<Vec<T>> {
            match store.get(key).await? {
                Some(value) => Ok(serde_json::from_value(value)?),
                None => Ok(Vec::new()),
            }
        }

        Ok(Document {
            resources: load_list(&self.store, keys::RESOURCES).await?,
            questions: load_list(&self.store, keys::QUESTIONS).await?,
            sub_questions: load_list(&self.store, keys::SUB_QUESTIONS).await?,
            answers: load_list(&self.store, keys::ANSWERS).await?,
            metadata: match self.store.get(keys::METADATA).await? {
                Some(value) => serde_json::from_value(value)?,
                None => Default::default(),
            },
        })
    }

    /// Overwrite the local store entity-by-entity.
    pub async fn save_document(&self, document: &Document) -> QuillResult<()> {
        self.store
            .set(keys::RESOURCES, serde_json::to_value(&document.resources)?)
            .await?;
        self.store
            .set(keys::QUESTIONS, serde_json::to_value(&document.questions)?)
            .await?;
        self.store
            .set(
                keys::SUB_QUESTIONS,
                serde_json::to_value(&document.sub_questions)?,
            )
            .await?;
        self.store
            .set(keys::ANSWERS, serde_json::to_value(&document.answers)?)
            .await?;
        self.store
            .set(keys::METADATA, serde_json::to_value(&document.metadata)?)
            .await
    }

    async fn load_base(&self) -> QuillResult<Option<Document>> {
        match self.store.get(keys::SYNC_BASE).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn remote_handle(&self) -> QuillResult<Option<RemoteHandle>> {
        match self.store.get(keys::REMOTE_HANDLE).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn last_push_hash(&self) -> QuillResult<Option<String>> {
        Ok(self
            .store
            .get(keys::LAST_PUSH_HASH)
            .await?
            .and_then(|v| v.as_str().map(String::from)))
    }

    /// When the last successful sync completed.
    pub async fn last_sync_time(&self) -> QuillResult<Option<DateTime<Utc>>> {
        match self.store.get(keys::LAST_SYNC_TIME).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(None),
        }
    }

    fn ensure_authenticated(&self) -> QuillResult<()> {
        if self.gate.is_authenticated() {
            Ok(())
        } else {
            Err(QuillError::Auth {
                reason: "not authenticated".into(),
            })
        }
    }

    async fn fail(&self, entry_type: SyncHistoryType, err: QuillError) -> QuillError {
        tracing::warn!(error = %err, "sync operation failed");
        self.status.set(SyncStatus::Error);
        // History write is best effort here; the original error wins.
        let _ = self
            .history
            .record(SyncHistoryEntry::failure(entry_type, err.to_string()))
            .await;
        err
    }

    // --- Push ---

    /// Upload local state. Applies the pending queue onto the last-known
    /// synced base (falling back to the current local document) to build
    /// the payload. On success the queue is cleared; on failure it is left
    /// untouched as the retry buffer.
    pub async fn push(&self) -> QuillResult<PushReport> {
        if self.gate.current_mode() != AccessMode::WriteEnabled {
            return Ok(PushReport::skipped());
        }
        self.ensure_authenticated()?;

        self.status.set(SyncStatus::Syncing);
        match self.push_inner().await {
            Ok(report) => {
                self.status.set(SyncStatus::Idle);
                Ok(report)
            }
            Err(err) => Err(self.fail(SyncHistoryType::Push, err).await),
        }
    }

    async fn push_inner(&self) -> QuillResult<PushReport> {
        let local = self.load_document().await?;
        let entries = self.queue.snapshot().await;

        let (mut payload_doc, changes) = if entries.is_empty() {
            (local.clone(), ChangeCounts::default())
        } else {
            let mut base = self.load_base().await?.unwrap_or_else(|| local.clone());
            let counts = queue::apply_entries(&mut base, &entries)?;
            (base, counts)
        };
        payload_doc.metadata.last_sync = Some(Utc::now());

        self.upload(payload_doc, changes, SyncHistoryType::Push)
            .await
    }

    /// Write a payload document to the remote store and commit the local
    /// bookkeeping. Shared by push and the merge path of bidirectional
    /// sync.
    async fn upload(
        &self,
        payload_doc: Document,
        changes: ChangeCounts,
        entry_type: SyncHistoryType,
    ) -> QuillResult<PushReport> {
        let hash = content_hash(&payload_doc)?;
        let handle = self.remote_handle().await?;

        let (version, outcome) = if handle.is_some() && self.last_push_hash().await? == Some(hash.clone())
        {
            tracing::info!("push: payload identical to last upload, skipping remote write");
            (None, PushOutcome::NoopIdentical)
        } else {
            let payload = payload_doc.to_payload()?;
            Document::validate_shape(&payload)?;
            match handle {
                Some(ref h) => {
                    let version = self.remote.update(&h.id, &payload).await?;
                    (Some(version), PushOutcome::Uploaded)
                }
                None => {
                    let created = self.remote.create(&payload).await?;
                    tracing::info!(remote_id = %created.id, "push: created remote document");
                    self.store
                        .set(keys::REMOTE_HANDLE, serde_json::to_value(&created)?)
                        .await?;
                    (None, PushOutcome::Uploaded)
                }
            }
        };

        // Only after the remote write succeeded: clear the queue and
        // record the new synced base.
        self.queue.clear().await?;
        self.save_document(&payload_doc).await?;
        self.store
            .set(keys::SYNC_BASE, serde_json::to_value(&payload_doc)?)
            .await?;
        self.store.set(keys::LAST_PUSH_HASH, json!(hash)).await?;
        self.store
            .set(keys::LAST_SYNC_TIME, json!(Utc::now()))
            .await?;
        self.history
            .record(SyncHistoryEntry::success(entry_type, changes))
            .await?;

        tracing::info!(
            added = changes.added,
            updated = changes.updated,
            deleted = changes.deleted,
            ?outcome,
            "push complete"
        );
        Ok(PushReport {
            outcome,
            changes,
            version,
        })
    }

    // --- Pull ---

    /// Fetch the remote document, validate its shape, and overwrite the
    /// local store entity-by-entity.
    ///
    /// Refuses to run while changes are queued and the remote moved past
    /// the recorded sync point: the overwrite would race the queued
    /// edits. Callers wanting both sides reconciled use
    /// [`Self::bidirectional_sync`] instead.
    pub async fn pull(&self) -> QuillResult<ChangeCounts> {
        self.ensure_authenticated()?;

        self.status.set(SyncStatus::Syncing);
        match self.pull_inner().await {
            Ok(counts) => {
                self.status.set(SyncStatus::Idle);
                Ok(counts)
            }
            Err(err) => Err(self.fail(SyncHistoryType::Pull, err).await),
        }
    }

    async fn pull_inner(&self) -> QuillResult<ChangeCounts> {
        let handle = self.remote_handle().await?.ok_or(QuillError::Transport {
            reason: "remote document not initialized".into(),
        })?;

        let fetched = self.remote.get(&handle.id).await?;
        // Shape failures abort here, before any local key is touched.
        let remote_doc = Document::from_payload(&fetched.payload)?;

        let before = self.load_document().await?;
        let pending = self.queue.count().await;
        if pending > 0 {
            let info = conflict::detect_conflict(&before, &remote_doc, pending);
            if info.has_conflict {
                return Err(QuillError::Conflict {
                    local_last_sync: info.local_last_sync,
                    remote_last_sync: info.remote_last_sync,
                });
            }
        }

        let counts = comparator::diff_documents(&before, &remote_doc);

        self.save_document(&remote_doc).await?;
        self.store
            .set(keys::SYNC_BASE, serde_json::to_value(&remote_doc)?)
            .await?;
        self.store
            .set(keys::LAST_PUSH_HASH, json!(content_hash(&remote_doc)?))
            .await?;
        self.store
            .set(keys::LAST_SYNC_TIME, json!(Utc::now()))
            .await?;
        self.history
            .record(SyncHistoryEntry::success(SyncHistoryType::Pull, counts))
            .await?;

        tracing::info!(
            added = counts.added,
            updated = counts.updated,
            deleted = counts.deleted,
            "pull complete"
        );
        Ok(counts)
    }

    // --- Bidirectional ---

    /// Pull first, then push. The ordering is deliberate: remote change is
    /// captured before deciding what to upload. If the two copies diverged,
    /// the conflict resolver merges them and the merged document is pushed
    /// instead of blindly overwriting.
    pub async fn bidirectional_sync(&self) -> QuillResult<BidirectionalReport> {
        self.ensure_authenticated()?;

        let Some(handle) = self.remote_handle().await? else {
            // Nothing remote yet; the push creates the document.
            let push = self.push().await?;
            return Ok(BidirectionalReport {
                pulled: ChangeCounts::default(),
                push,
                merged: false,
                strategy: None,
            });
        };

        self.status.set(SyncStatus::Syncing);
        let fetched = match self.remote.get(&handle.id).await {
            Ok(f) => f,
            Err(err) => return Err(self.fail(SyncHistoryType::Bidirectional, err).await),
        };
        let remote_doc = match Document::from_payload(&fetched.payload) {
            Ok(d) => d,
            Err(err) => return Err(self.fail(SyncHistoryType::Bidirectional, err).await),
        };

        let local = self.load_document().await?;
        let pending = self.queue.count().await;
        let info = conflict::detect_conflict(&local, &remote_doc, pending);

        if info.has_conflict {
            let strategy = conflict::recommended_strategy(&info);
            tracing::info!(
                conflicts = info.local_exclusive + info.remote_exclusive,
                ?strategy,
                "bidirectional: divergence detected, merging"
            );
            let outcome = conflict::smart_merge(&local, &remote_doc);
            let pulled = comparator::diff_documents(&local, &outcome.document);

            let mut merged = outcome.document;
            merged.metadata.last_sync = Some(Utc::now());
            let push = match self
                .upload(merged, pulled, SyncHistoryType::Bidirectional)
                .await
            {
                Ok(report) => report,
                Err(err) => return Err(self.fail(SyncHistoryType::Bidirectional, err).await),
            };
            self.status.set(SyncStatus::Idle);
            return Ok(BidirectionalReport {
                pulled,
                push,
                merged: true,
                strategy: Some(strategy),
            });
        }

        let pulled = self.pull().await?;
        let push = self.push().await?;
        Ok(BidirectionalReport {
            pulled,
            push,
            merged: false,
            strategy: None,
        })
    }

    // --- Check ---

    /// Read-only comparison of local and remote state. Mutates nothing;
    /// used to decide whether a full sync is warranted.
    pub async fn check_for_updates(&self) -> QuillResult<ComparisonResult> {
        self.ensure_authenticated()?;
        self.status.set(SyncStatus::Checking);

        let result = self.check_inner().await;
        self.status.set(match result {
            Ok(_) => SyncStatus::Idle,
            Err(_) => SyncStatus::Error,
        });
        result
    }

    async fn check_inner(&self) -> QuillResult<ComparisonResult> {
        let local = self.load_document().await?;
        let pending = self.queue.count().await;

        let remote_stats = match self.remote_handle().await? {
            Some(handle) => {
                let fetched = self.remote.get(&handle.id).await?;
                let remote_doc = Document::from_payload(&fetched.payload)?;
                comparator::generate_statistics(&remote_doc)
            }
            None => DataStatistics::default(),
        };

        Ok(comparator::compare(
            &local,
            &remote_stats,
            pending,
            local.metadata.last_sync,
        ))
    }
}
