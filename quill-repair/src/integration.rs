//! Repair-then-sync orchestration.
//!
//! Snapshots the pre-repair document, runs detect -> apply, re-validates,
//! and only if the result is clean writes it back and invokes a push.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use quill_core::config::RepairPolicy;
use quill_core::constants::keys;
use quill_core::errors::{QuillError, QuillResult};
use quill_core::model::{Document, EntityKind, IsolatedItem};
use quill_core::traits::LocalStore;
use quill_sync::service::{PushReport, SyncService};

use crate::analyzer::analyze_errors;
use crate::backup::BackupStore;
use crate::detector::detect_errors;
use crate::repairer::apply_repairs;

/// Combined result of a repair-and-sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairSyncReport {
    /// Violations found by the initial detection pass.
    pub errors_detected: usize,
    /// Repair actions that applied cleanly.
    pub repairs_applied: usize,
    /// Actions that failed to apply.
    pub repairs_failed: usize,
    /// Records moved out of the active data set.
    pub items_isolated: usize,
    /// Handle of the pre-repair snapshot.
    pub backup_id: String,
    /// Outcome of the push phase; `None` when nothing needed repairing
    /// and the queue was empty too.
    pub sync: Option<PushReport>,
}

/// Chains the repair pipeline into a push.
pub struct RepairSyncIntegration {
    store: Arc<dyn LocalStore>,
    service: Arc<SyncService>,
    backups: BackupStore,
    policy: RepairPolicy,
}

impl RepairSyncIntegration {
    pub async fn new(
        store: Arc<dyn LocalStore>,
        service: Arc<SyncService>,
        policy: RepairPolicy,
    ) -> QuillResult<Self> {
        let backups = BackupStore::load(store.clone()).await?;
        Ok(Self {
            store,
            service,
            backups,
            policy,
        })
    }

    /// The bounded backup list.
    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Assemble the raw payload straight from the store keys. Typed
    /// deserialization would reject exactly the corrupt records this
    /// pipeline exists to handle, so repair reads the untyped form.
    async fn load_raw_payload(&self) -> QuillResult<Value> {
        let mut payload = json!({
            "resources": [],
            "questions": [],
            "subQuestions": [],
            "answers": [],
            "metadata": {},
        });
        for (key, wire) in [
            (keys::RESOURCES, "resources"),
            (keys::QUESTIONS, "questions"),
            (keys::SUB_QUESTIONS, "subQuestions"),
            (keys::ANSWERS, "answers"),
            (keys::METADATA, "metadata"),
        ] {
            if let Some(value) = self.store.get(key).await? {
                payload[wire] = value;
            }
        }
        Ok(payload)
    }

    /// Repair the current local document and, if the result validates
    /// cleanly, push it. `extra_selected` adds manually approved actions
    /// on top of the plan's auto-applicable ones.
    pub async fn repair_and_sync(
        &self,
        backup_label: &str,
        extra_selected: &[String],
    ) -> QuillResult<RepairSyncReport> {
        let document = self.load_raw_payload().await?;

        let backup_id = self.backups.create(backup_label, &document).await?;

        let detection = detect_errors(&document)?;
        if detection.is_valid() {
            tracing::info!("repair-sync: document already clean, pushing");
            let push = self.service.push().await?;
            return Ok(RepairSyncReport {
                errors_detected: 0,
                repairs_applied: 0,
                repairs_failed: 0,
                items_isolated: 0,
                backup_id,
                sync: Some(push),
            });
        }

        let plan = analyze_errors(&detection.errors, &document, &self.policy);
        let mut selected = plan.auto_action_ids();
        selected.extend(extra_selected.iter().cloned());
        let outcome = apply_repairs(&document, &plan, &selected)?;

        // Re-validate before anything touches the store or the remote.
        let recheck = detect_errors(&outcome.document)?;
        if !recheck.is_valid() {
            return Err(QuillError::Repair {
                action_id: String::new(),
                reason: format!(
                    "document still has {} violations after repair",
                    recheck.errors.len()
                ),
            });
        }

        let repaired = Document::from_payload(&outcome.document)?;
        self.service.save_document(&repaired).await?;
        // The push payload is rebuilt from the synced base plus the queue,
        // so the base must carry the repairs too: otherwise queued edits
        // would resurrect the pre-repair records.
        self.store
            .set(keys::SYNC_BASE, serde_json::to_value(&repaired)?)
            .await?;
        self.persist_isolated(&outcome.isolated).await?;

        let push = self.service.push().await?;
        tracing::info!(
            errors = detection.errors.len(),
            applied = outcome.applied.len(),
            isolated = outcome.isolated.len(),
            "repair-sync complete"
        );
        Ok(RepairSyncReport {
            errors_detected: detection.errors.len(),
            repairs_applied: outcome.applied.len(),
            repairs_failed: outcome.failed.len(),
            items_isolated: outcome.isolated.len(),
            backup_id,
            sync: Some(push),
        })
    }

    /// Append newly isolated records to the persisted list. They stay
    /// there until explicit manual fix-and-revalidate.
    async fn persist_isolated(&self, items: &[IsolatedItem]) -> QuillResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut existing: Vec<IsolatedItem> = match self.store.get(keys::ISOLATED_ITEMS).await? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        existing.extend(items.iter().cloned());
        self.store
            .set(keys::ISOLATED_ITEMS, serde_json::to_value(&existing)?)
            .await
    }

    /// Currently isolated records.
    pub async fn isolated_items(&self) -> QuillResult<Vec<IsolatedItem>> {
        match self.store.get(keys::ISOLATED_ITEMS).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Manually resolve an isolated record: re-validate the fixed data
    /// against the current document and, when clean, return it to its
    /// collection. The item leaves the isolated list only on success.
    /// Ids are only unique within a kind, so the lookup needs both.
    pub async fn resolve_isolated(
        &self,
        kind: EntityKind,
        entity_id: &str,
        fixed: serde_json::Value,
    ) -> QuillResult<bool> {
        let mut items = self.isolated_items().await?;
        let Some(pos) = items
            .iter()
            .position(|i| i.entity_kind == kind && i.entity_id == entity_id)
        else {
            return Ok(false);
        };

        let mut document = self.service.load_document().await?;
        let payload = document.to_payload()?;
        let residual = crate::detector::validate_in_context(kind, &fixed, &payload);
        if !residual.is_empty() {
            return Err(QuillError::Repair {
                action_id: String::new(),
                reason: format!(
                    "fixed record still has {} violations",
                    residual.len()
                ),
            });
        }

        document.upsert(kind, &fixed)?;
        self.service.save_document(&document).await?;
        self.store
            .set(keys::SYNC_BASE, serde_json::to_value(&document)?)
            .await?;

        items.remove(pos);
        self.store
            .set(keys::ISOLATED_ITEMS, serde_json::to_value(&items)?)
            .await?;
        Ok(true)
    }
}
