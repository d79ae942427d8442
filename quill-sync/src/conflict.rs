//! Divergence detection and entity-level merge.
//!
//! The merge is record-granularity last-writer-wins over a pure per-kind
//! reducer. Known gap, kept deliberately: there is no delete propagation,
//! so a record deleted on one side but edited on the other resurrects
//! after a merge.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quill_core::model::{Document, EntityKind, SyncEntity};

/// Result of conflict detection between the two document copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictInfo {
    /// True iff local has pending changes and the remote `lastSync` is
    /// strictly newer than the local record of it — both sides diverged
    /// independently from the last common point.
    pub has_conflict: bool,
    pub local_last_sync: Option<DateTime<Utc>>,
    pub remote_last_sync: Option<DateTime<Utc>>,
    /// Records present only in the local copy, per kind.
    pub local_exclusive: usize,
    /// Records present only in the remote copy, per kind.
    pub remote_exclusive: usize,
}

/// How a detected conflict should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    UseLocal,
    UseRemote,
    Merge,
}

/// Outcome of a smart merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: Document,
    /// Ids present on both sides where last-writer-wins picked a winner.
    pub conflicting_ids: Vec<(EntityKind, String)>,
}

fn exclusive_counts(local: &Document, remote: &Document) -> (usize, usize) {
    let mut local_only = 0;
    let mut remote_only = 0;
    for kind in EntityKind::ALL {
        let local_ids: HashSet<String> = local.ids(kind).into_iter().collect();
        let remote_ids: HashSet<String> = remote.ids(kind).into_iter().collect();
        local_only += local_ids.difference(&remote_ids).count();
        remote_only += remote_ids.difference(&local_ids).count();
    }
    (local_only, remote_only)
}

/// Detect whether local and remote histories diverged.
pub fn detect_conflict(local: &Document, remote: &Document, pending_changes: usize) -> ConflictInfo {
    let local_last_sync = local.metadata.last_sync;
    let remote_last_sync = remote.metadata.last_sync;

    let remote_newer = match (remote_last_sync, local_last_sync) {
        (Some(r), Some(l)) => r > l,
        (Some(_), None) => true,
        (None, _) => false,
    };
    let has_conflict = pending_changes > 0 && remote_newer;

    let (local_exclusive, remote_exclusive) = exclusive_counts(local, remote);

    ConflictInfo {
        has_conflict,
        local_last_sync,
        remote_last_sync,
        local_exclusive,
        remote_exclusive,
    }
}

/// Pure per-kind reducer: union by id, later `updated_at` wins for ids on
/// both sides, one-sided ids are kept unconditionally.
pub fn merge_lists<T: SyncEntity>(
    local: &[T],
    remote: &[T],
) -> (Vec<T>, Vec<String>) {
    let remote_map: HashMap<&str, &T> = remote.iter().map(|e| (e.id(), e)).collect();
    let local_ids: HashSet<&str> = local.iter().map(SyncEntity::id).collect();

    let mut merged = Vec::with_capacity(local.len().max(remote.len()));
    let mut conflicting = Vec::new();

    for record in local {
        match remote_map.get(record.id()) {
            Some(other) => {
                conflicting.push(record.id().to_string());
                if record.updated_at() >= other.updated_at() {
                    merged.push(record.clone());
                } else {
                    merged.push((*other).clone());
                }
            }
            None => merged.push(record.clone()),
        }
    }
    for record in remote {
        if !local_ids.contains(record.id()) {
            merged.push(record.clone());
        }
    }

    (merged, conflicting)
}

/// Merge two document copies entity-kind by entity-kind.
pub fn smart_merge(local: &Document, remote: &Document) -> MergeOutcome {
    let mut conflicting_ids = Vec::new();
    let mut record = |kind: EntityKind, ids: Vec<String>| {
        conflicting_ids.extend(ids.into_iter().map(|id| (kind, id)));
    };

    let (resources, ids) = merge_lists(&local.resources, &remote.resources);
    record(EntityKind::Resource, ids);
    let (questions, ids) = merge_lists(&local.questions, &remote.questions);
    record(EntityKind::BigQuestion, ids);
    let (sub_questions, ids) = merge_lists(&local.sub_questions, &remote.sub_questions);
    record(EntityKind::SubQuestion, ids);
    let (answers, ids) = merge_lists(&local.answers, &remote.answers);
    record(EntityKind::Answer, ids);

    // Keep the newer metadata record; the caller stamps lastSync after
    // the merged document is persisted.
    let metadata = match (local.metadata.last_sync, remote.metadata.last_sync) {
        (Some(l), Some(r)) if r > l => remote.metadata.clone(),
        (None, Some(_)) => remote.metadata.clone(),
        _ => local.metadata.clone(),
    };

    MergeOutcome {
        document: Document {
            resources,
            questions,
            sub_questions,
            answers,
            metadata,
        },
        conflicting_ids,
    }
}

/// Pick a strategy from the detection result: merge whenever both sides
/// have exclusive content, one-sided strategies only when the other side
/// is a strict superset of the common ancestor.
pub fn recommended_strategy(info: &ConflictInfo) -> MergeStrategy {
    match (info.local_exclusive > 0, info.remote_exclusive > 0) {
        (true, false) => MergeStrategy::UseLocal,
        (false, true) => MergeStrategy::UseRemote,
        _ => MergeStrategy::Merge,
    }
}
