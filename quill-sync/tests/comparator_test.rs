//! Statistics generation, local/remote comparison and document diffing.

mod common;

use std::collections::HashMap;

use common::{big_question, resource, sub_question, ts};

use quill_core::model::{DataStatistics, Document, EntityKind, SyncRecommendation};
use quill_sync::comparator::{compare, diff_documents, generate_statistics};

fn doc_with(resources: u32, questions: u32) -> Document {
    let mut doc = Document::default();
    for i in 0..resources {
        doc.resources.push(resource(&format!("r{i}"), 1));
    }
    for i in 0..questions {
        doc.questions.push(big_question(&format!("q{i}"), 1));
    }
    doc
}

fn remote_stats(resources: usize, questions: usize) -> DataStatistics {
    let mut counts = HashMap::new();
    counts.insert(EntityKind::Resource, resources);
    counts.insert(EntityKind::BigQuestion, questions);
    counts.insert(EntityKind::SubQuestion, 0);
    counts.insert(EntityKind::Answer, 0);
    DataStatistics {
        counts,
        last_modified: Some(ts(2)),
    }
}

#[test]
fn statistics_count_every_kind() {
    let mut doc = doc_with(2, 1);
    doc.sub_questions.push(sub_question("sq1", "q0", 1));

    let stats = generate_statistics(&doc);
    assert_eq!(stats.count(EntityKind::Resource), 2);
    assert_eq!(stats.count(EntityKind::BigQuestion), 1);
    assert_eq!(stats.count(EntityKind::SubQuestion), 1);
    assert_eq!(stats.count(EntityKind::Answer), 0);
    assert_eq!(stats.total(), 4);
}

#[test]
fn last_modified_is_max_of_metadata_and_entities() {
    let mut doc = Document::default();
    doc.metadata.last_sync = Some(ts(3));
    doc.resources.push(resource("r1", 1));
    doc.resources.push(resource("r2", 5));

    let stats = generate_statistics(&doc);
    assert_eq!(stats.last_modified, Some(ts(5)));

    // With no entities, metadata.lastSync alone decides.
    let empty = Document {
        metadata: doc.metadata.clone(),
        ..Document::default()
    };
    assert_eq!(generate_statistics(&empty).last_modified, Some(ts(3)));

    assert_eq!(generate_statistics(&Document::default()).last_modified, None);
}

#[test]
fn remote_ahead_with_clean_local_recommends_pull() {
    // Local has 5 resources / 3 questions; remote reports 7 / 3 and a
    // newer last-modified. Nothing is queued locally.
    let local = doc_with(5, 3);
    let remote = remote_stats(7, 3);

    let result = compare(&local, &remote, 0, Some(ts(1)));
    assert_eq!(result.recommendation, SyncRecommendation::Pull);
    assert!(result.has_changes);
    assert_eq!(result.differences[&EntityKind::Resource], 2);
    assert_eq!(result.differences[&EntityKind::BigQuestion], 0);
}

#[test]
fn pending_changes_with_unchanged_remote_recommend_push() {
    let local = doc_with(5, 3);
    let mut remote = remote_stats(5, 3);
    remote.last_modified = Some(ts(1));

    // Two changes queued, remote not modified since the recorded sync.
    let result = compare(&local, &remote, 2, Some(ts(1)));
    assert_eq!(result.recommendation, SyncRecommendation::Push);
    assert!(!result.has_changes);
}

#[test]
fn both_sides_dirty_recommend_merge() {
    let local = doc_with(5, 3);
    let remote = remote_stats(7, 3);

    let result = compare(&local, &remote, 2, Some(ts(1)));
    assert_eq!(result.recommendation, SyncRecommendation::Merge);
}

#[test]
fn neither_side_dirty_recommends_skip() {
    let local = doc_with(5, 3);
    let mut remote = remote_stats(5, 3);
    remote.last_modified = Some(ts(1));

    let result = compare(&local, &remote, 0, Some(ts(1)));
    assert_eq!(result.recommendation, SyncRecommendation::Skip);
}

#[test]
fn remote_counts_equal_but_newer_still_pulls() {
    // Count differences are informational; the recommendation follows
    // timestamps and queue depth alone.
    let local = doc_with(5, 3);
    let remote = remote_stats(5, 3);

    let result = compare(&local, &remote, 0, Some(ts(1)));
    assert_eq!(result.recommendation, SyncRecommendation::Pull);
    assert!(!result.has_changes);
}

#[test]
fn never_synced_local_treats_any_remote_as_changed() {
    let local = doc_with(0, 0);
    let remote = remote_stats(1, 0);

    let result = compare(&local, &remote, 0, None);
    assert_eq!(result.recommendation, SyncRecommendation::Pull);
}

#[test]
fn diff_counts_added_updated_and_deleted() {
    let mut before = Document::default();
    before.resources.push(resource("keep", 1));
    before.resources.push(resource("touch", 1));
    before.resources.push(resource("drop", 1));
    before.questions.push(big_question("q1", 1));

    let mut after = Document::default();
    after.resources.push(resource("keep", 1));
    after.resources.push(resource("touch", 4)); // newer updated_at
    after.resources.push(resource("fresh", 4));
    after.questions.push(big_question("q1", 1));

    let counts = diff_documents(&before, &after);
    assert_eq!(counts.added, 1);
    assert_eq!(counts.updated, 1);
    assert_eq!(counts.deleted, 1);
    assert_eq!(counts.total(), 3);
}

#[test]
fn diff_of_identical_documents_is_empty() {
    let doc = doc_with(3, 2);
    assert_eq!(diff_documents(&doc, &doc).total(), 0);
}
