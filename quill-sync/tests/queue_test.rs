//! Pending change queue: merge table rows and the reduction property
//! (applying the merged queue equals applying the raw sequence).

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use quill_core::model::{ChangeType, Document, EntityKind, PendingChange};
use quill_core::store::MemoryStore;
use quill_core::traits::LocalStore;
use quill_sync::queue::{self, PendingChangeQueue};

fn record(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "created_at": "2026-06-01T00:00:00Z",
        "updated_at": "2026-06-01T01:00:00Z"
    })
}

fn create(id: &str, title: &str) -> PendingChange {
    PendingChange::create(EntityKind::Resource, id, record(id, title))
}

fn update(id: &str, title: &str) -> PendingChange {
    PendingChange::update(EntityKind::Resource, id, record(id, title))
}

fn delete(id: &str) -> PendingChange {
    PendingChange::delete(EntityKind::Resource, id)
}

// --- Merge table ---

#[test]
fn create_then_update_stays_create_with_new_data() {
    let mut entries = Vec::new();
    queue::merge_into(&mut entries, create("r1", "first"));
    queue::merge_into(&mut entries, update("r1", "second"));

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].change_type, ChangeType::Create);
    assert_eq!(entries[0].data.as_ref().unwrap()["title"], "second");
}

#[test]
fn create_then_delete_removes_entry() {
    let mut entries = Vec::new();
    queue::merge_into(&mut entries, create("r1", "first"));
    queue::merge_into(&mut entries, delete("r1"));
    assert!(entries.is_empty(), "net no-op must leave no entry");
}

#[test]
fn update_then_update_replaces_data() {
    let mut entries = Vec::new();
    queue::merge_into(&mut entries, update("r1", "first"));
    queue::merge_into(&mut entries, update("r1", "second"));

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].change_type, ChangeType::Update);
    assert_eq!(entries[0].data.as_ref().unwrap()["title"], "second");
}

#[test]
fn update_then_delete_becomes_delete_without_data() {
    let mut entries = Vec::new();
    queue::merge_into(&mut entries, update("r1", "first"));
    queue::merge_into(&mut entries, delete("r1"));

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].change_type, ChangeType::Delete);
    assert!(entries[0].data.is_none());
}

#[test]
fn delete_then_create_is_a_recreate() {
    let mut entries = Vec::new();
    queue::merge_into(&mut entries, delete("r1"));
    queue::merge_into(&mut entries, create("r1", "reborn"));

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].change_type, ChangeType::Create);
    assert_eq!(entries[0].data.as_ref().unwrap()["title"], "reborn");
}

#[test]
fn distinct_keys_do_not_merge() {
    let mut entries = Vec::new();
    queue::merge_into(&mut entries, create("r1", "a"));
    queue::merge_into(&mut entries, create("r2", "b"));
    queue::merge_into(
        &mut entries,
        PendingChange::create(EntityKind::Answer, "r1", json!({ "id": "r1" })),
    );
    assert_eq!(entries.len(), 3, "different (kind, id) keys stay separate");
}

// --- Durable queue ---

#[tokio::test]
async fn append_persists_and_clear_resets() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let q = PendingChangeQueue::load(store.clone()).await.unwrap();

    q.append(create("r1", "a")).await.unwrap();
    q.append(update("r1", "b")).await.unwrap();
    assert_eq!(q.count().await, 1);
    assert!(q.has_pending().await);

    // A fresh load sees the persisted reduced queue.
    let reloaded = PendingChangeQueue::load(store.clone()).await.unwrap();
    assert_eq!(reloaded.count().await, 1);

    q.clear().await.unwrap();
    assert!(!q.has_pending().await);
    let reloaded = PendingChangeQueue::load(store).await.unwrap();
    assert_eq!(reloaded.count().await, 0);
}

#[tokio::test]
async fn concurrent_appends_serialize() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let q = Arc::new(PendingChangeQueue::load(store.clone()).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..16 {
        let q = q.clone();
        handles.push(tokio::spawn(async move {
            q.append(update("r1", &format!("t{i}"))).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(q.count().await, 1, "same key always merges to one entry");
    let persisted = store.get("quill.pendingChanges").await.unwrap().unwrap();
    assert_eq!(persisted.as_array().unwrap().len(), 1);
}

// --- Reduction property ---

/// Apply raw operations one at a time, without merging.
fn apply_sequentially(base: &Document, ops: &[PendingChange]) -> Document {
    let mut doc = base.clone();
    for op in ops {
        queue::apply_entries(&mut doc, std::slice::from_ref(op)).unwrap();
    }
    doc
}

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    Update(String),
    Delete,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{3}".prop_map(Op::Create),
        "[a-z]{3}".prop_map(Op::Update),
        Just(Op::Delete),
    ]
}

proptest! {
    /// For any op sequence against a handful of keys, the queue holds at
    /// most one entry per key and the reduced queue produces the same
    /// final document as the raw sequence.
    #[test]
    fn reduced_queue_equals_sequential_application(
        ops in prop::collection::vec((0usize..4, op_strategy()), 0..40)
    ) {
        // Op keys start absent from the base; a create is only ever recorded
        // for a record the base has not seen. Seeds use a disjoint id space.
        let keys = ["k0", "k1", "k2", "k3"];
        let mut base = Document::default();
        for id in ["seed-a", "seed-b"] {
            base.upsert(EntityKind::Resource, &record(id, "seed")).unwrap();
        }

        let raw: Vec<PendingChange> = ops
            .iter()
            .map(|(k, op)| match op {
                Op::Create(title) => create(keys[*k], title),
                Op::Update(title) => update(keys[*k], title),
                Op::Delete => delete(keys[*k]),
            })
            .collect();

        let mut reduced = Vec::new();
        for change in raw.clone() {
            queue::merge_into(&mut reduced, change);

            // Invariant: never more than one entry per key.
            for key in keys {
                let n = reduced
                    .iter()
                    .filter(|e| e.entity_id == key)
                    .count();
                prop_assert!(n <= 1, "key {key} has {n} entries");
            }
        }

        let sequential = apply_sequentially(&base, &raw);
        let mut merged = base.clone();
        queue::apply_entries(&mut merged, &reduced).unwrap();

        prop_assert_eq!(sequential.resources, merged.resources);
    }
}
