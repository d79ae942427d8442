//! Shared fakes for the repair integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use quill_core::errors::{QuillError, QuillResult};
use quill_core::store::MemoryStore;
use quill_core::traits::{
    AccessMode, ChangeStats, LocalStore, PermissionGate, RemoteDocument, RemoteDocumentClient,
    RemoteHandle, VersionInfo,
};
use quill_sync::service::SyncService;

/// Minimal single-document remote fake.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<Option<(Value, Vec<VersionInfo>)>>,
    pub write_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn current_payload(&self) -> Option<Value> {
        self.state.lock().await.as_ref().map(|(p, _)| p.clone())
    }
}

#[async_trait]
impl RemoteDocumentClient for FakeRemote {
    async fn create(&self, payload: &Value) -> QuillResult<RemoteHandle> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let version = VersionInfo {
            id: "v1".into(),
            committed_at: Utc::now(),
            change_stats: ChangeStats::default(),
        };
        *self.state.lock().await = Some((payload.clone(), vec![version]));
        Ok(RemoteHandle {
            id: "doc-1".into(),
            url: "https://remote.example/doc-1".into(),
        })
    }

    async fn update(&self, _id: &str, payload: &Value) -> QuillResult<VersionInfo> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        let (current, versions) = state.get_or_insert_with(|| (Value::Null, Vec::new()));
        *current = payload.clone();
        let version = VersionInfo {
            id: format!("v{}", versions.len() + 1),
            committed_at: Utc::now(),
            change_stats: ChangeStats::default(),
        };
        versions.push(version.clone());
        Ok(version)
    }

    async fn get(&self, _id: &str) -> QuillResult<RemoteDocument> {
        let state = self.state.lock().await;
        let (payload, versions) = state.as_ref().ok_or(QuillError::Transport {
            reason: "document does not exist".into(),
        })?;
        Ok(RemoteDocument {
            payload: payload.clone(),
            versions: versions.clone(),
        })
    }

    async fn get_version(&self, _id: &str, _version_id: &str) -> QuillResult<Value> {
        Err(QuillError::Transport {
            reason: "version history not supported by this fake".into(),
        })
    }
}

/// Always-authenticated, always-writable gate.
pub struct WriterGate;

impl PermissionGate for WriterGate {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn current_mode(&self) -> AccessMode {
        AccessMode::WriteEnabled
    }
}

/// Fresh store, remote, and service over the writer gate.
pub async fn service_setup() -> (Arc<MemoryStore>, Arc<FakeRemote>, Arc<SyncService>) {
    let store = Arc::new(MemoryStore::new());
    let remote = FakeRemote::new();
    let service = SyncService::new(store.clone(), remote.clone(), Arc::new(WriterGate))
        .await
        .unwrap();
    (store, remote, Arc::new(service))
}

/// Write a raw payload into the per-entity store keys, bypassing the
/// typed model, exactly the way corrupt data arrives in practice.
pub async fn seed_raw_payload(store: &MemoryStore, payload: &Value) {
    for (key, wire) in [
        (quill_core::constants::keys::RESOURCES, "resources"),
        (quill_core::constants::keys::QUESTIONS, "questions"),
        (quill_core::constants::keys::SUB_QUESTIONS, "subQuestions"),
        (quill_core::constants::keys::ANSWERS, "answers"),
        (quill_core::constants::keys::METADATA, "metadata"),
    ] {
        store.set(key, payload[wire].clone()).await.unwrap();
    }
}
