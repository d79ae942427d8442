//! Statistics and local/remote comparison with a sync recommendation.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use quill_core::model::{
    ChangeCounts, ComparisonResult, DataStatistics, Document, EntityKind, SyncEntity,
    SyncRecommendation,
};

/// Count entities per kind and compute `last_modified` as the max of
/// `metadata.lastSync` and every entity's `updated_at`.
pub fn generate_statistics(document: &Document) -> DataStatistics {
    let mut counts = HashMap::new();
    for kind in EntityKind::ALL {
        counts.insert(kind, document.count(kind));
    }

    let mut last_modified = document.metadata.last_sync;
    let mut track = |ts: DateTime<Utc>| {
        if last_modified.map_or(true, |cur| ts > cur) {
            last_modified = Some(ts);
        }
    };
    document.resources.iter().for_each(|e| track(e.updated_at));
    document.questions.iter().for_each(|e| track(e.updated_at));
    document
        .sub_questions
        .iter()
        .for_each(|e| track(e.updated_at));
    document.answers.iter().for_each(|e| track(e.updated_at));

    DataStatistics {
        counts,
        last_modified,
    }
}

/// Compare a local document against remote statistics.
///
/// `pending_changes` is the current queue depth; `recorded_last_sync` is
/// the local document's record of the last completed sync. Recommendation
/// precedence: push (local dirty, remote unchanged), pull (remote changed,
/// local clean), merge (both changed), skip (neither).
pub fn compare(
    local_doc: &Document,
    remote: &DataStatistics,
    pending_changes: usize,
    recorded_last_sync: Option<DateTime<Utc>>,
) -> ComparisonResult {
    let local = generate_statistics(local_doc);

    let mut differences = HashMap::new();
    for kind in EntityKind::ALL {
        differences.insert(kind, remote.count(kind) as i64 - local.count(kind) as i64);
    }
    let has_changes = differences.values().any(|&d| d != 0);

    let local_dirty = pending_changes > 0;
    let remote_changed = match (remote.last_modified, recorded_last_sync) {
        (Some(remote_ts), Some(local_ts)) => remote_ts > local_ts,
        (Some(_), None) => true,
        (None, _) => false,
    };

    let recommendation = match (local_dirty, remote_changed) {
        (true, false) => SyncRecommendation::Push,
        (false, true) => SyncRecommendation::Pull,
        (true, true) => SyncRecommendation::Merge,
        (false, false) => SyncRecommendation::Skip,
    };

    ComparisonResult {
        local,
        remote: remote.clone(),
        differences,
        has_changes,
        recommendation,
    }
}

/// Per-record diff counts between two documents (added/updated/deleted
/// seen from `before` to `after`).
pub fn diff_documents(before: &Document, after: &Document) -> ChangeCounts {
    fn diff_lists<T: SyncEntity>(before: &[T], after: &[T], counts: &mut ChangeCounts) {
        let before_ids: HashMap<&str, DateTime<Utc>> =
            before.iter().map(|e| (e.id(), e.updated_at())).collect();
        let after_ids: HashSet<&str> = after.iter().map(SyncEntity::id).collect();

        for record in after {
            match before_ids.get(record.id()) {
                None => counts.added += 1,
                Some(&prev) if prev != record.updated_at() => counts.updated += 1,
                Some(_) => {}
            }
        }
        counts.deleted += before
            .iter()
            .filter(|e| !after_ids.contains(e.id()))
            .count();
    }

    let mut counts = ChangeCounts::default();
    diff_lists(&before.resources, &after.resources, &mut counts);
    diff_lists(&before.questions, &after.questions, &mut counts);
    diff_lists(&before.sub_questions, &after.sub_questions, &mut counts);
    diff_lists(&before.answers, &after.answers, &mut counts);
    counts
}
