//! Shared fakes and builders for the sync integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use quill_core::errors::{QuillError, QuillResult};
use quill_core::model::{Answer, BigQuestion, Document, QuestionStatus, Resource, SubQuestion};
use quill_core::store::MemoryStore;
use quill_core::traits::{
    AccessMode, ChangeStats, PermissionGate, RemoteDocument, RemoteDocumentClient, RemoteHandle,
    VersionInfo,
};
use quill_sync::service::SyncService;

/// Remote document store fake: one document, full version history,
/// injectable failures and latency.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<Option<(Value, Vec<VersionInfo>)>>,
    pub fail_next: AtomicBool,
    pub get_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    pub latency_ms: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed the remote with an existing payload.
    pub async fn seed(&self, payload: Value) {
        let version = VersionInfo {
            id: "v1".into(),
            committed_at: Utc::now(),
            change_stats: ChangeStats::default(),
        };
        *self.state.lock().await = Some((payload, vec![version]));
    }

    pub async fn current_payload(&self) -> Option<Value> {
        self.state.lock().await.as_ref().map(|(p, _)| p.clone())
    }

    pub async fn version_count(&self) -> usize {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|(_, v)| v.len())
            .unwrap_or(0)
    }

    async fn maybe_fail(&self) -> QuillResult<()> {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms as u64)).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(QuillError::Transport {
                reason: "injected network failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteDocumentClient for FakeRemote {
    async fn create(&self, payload: &Value) -> QuillResult<RemoteHandle> {
        self.maybe_fail().await?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.seed(payload.clone()).await;
        Ok(RemoteHandle {
            id: "doc-1".into(),
            url: "https://remote.example/doc-1".into(),
        })
    }

    async fn update(&self, _id: &str, payload: &Value) -> QuillResult<VersionInfo> {
        self.maybe_fail().await?;
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
        self.maybe_fail().await?;
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        let (payload, versions) = state.as_ref().ok_or(QuillError::Transport {
            reason: "document does not exist".into(),
        })?;
        Ok(RemoteDocument {
            payload: payload.clone(),
            versions: versions.clone(),
        })
    }

    async fn get_version(&self, _id: &str, version_id: &str) -> QuillResult<Value> {
        self.maybe_fail().await?;
        let state = self.state.lock().await;
        match state.as_ref() {
            Some((payload, versions)) if versions.iter().any(|v| v.id == version_id) => {
                Ok(payload.clone())
            }
            _ => Err(QuillError::Transport {
                reason: format!("version {version_id} not found"),
            }),
        }
    }
}

/// Permission gate fake with a switchable mode.
pub struct FakeGate {
    pub authenticated: AtomicBool,
    pub write_enabled: AtomicBool,
}

impl FakeGate {
    pub fn writer() -> Arc<Self> {
        Arc::new(Self {
            authenticated: AtomicBool::new(true),
            write_enabled: AtomicBool::new(true),
        })
    }

    pub fn reader() -> Arc<Self> {
        Arc::new(Self {
            authenticated: AtomicBool::new(true),
            write_enabled: AtomicBool::new(false),
        })
    }
}

impl PermissionGate for FakeGate {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn current_mode(&self) -> AccessMode {
        if self.write_enabled.load(Ordering::SeqCst) {
            AccessMode::WriteEnabled
        } else {
            AccessMode::ReadOnly
        }
    }
}

/// Stable timestamp helper.
pub fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap()
}

pub fn resource(id: &str, updated_hour: u32) -> Resource {
    Resource {
        id: id.into(),
        title: format!("resource {id}"),
        url: None,
        description: None,
        tags: Vec::new(),
        created_at: ts(0),
        updated_at: ts(updated_hour),
    }
}

pub fn big_question(id: &str, updated_hour: u32) -> BigQuestion {
    BigQuestion {
        id: id.into(),
        title: format!("question {id}"),
        description: None,
        status: QuestionStatus::Unsolved,
        sub_questions: Vec::new(),
        created_at: ts(0),
        updated_at: ts(updated_hour),
    }
}

pub fn sub_question(id: &str, parent: &str, updated_hour: u32) -> SubQuestion {
    SubQuestion {
        id: id.into(),
        parent_id: parent.into(),
        title: format!("sub-question {id}"),
        content: None,
        status: QuestionStatus::Unsolved,
        answers: Vec::new(),
        created_at: ts(0),
        updated_at: ts(updated_hour),
    }
}

pub fn answer(id: &str, updated_hour: u32) -> Answer {
    Answer {
        id: id.into(),
        content: format!("answer {id}"),
        created_at: ts(0),
        updated_at: ts(updated_hour),
    }
}

/// A service over fresh fakes: (store, remote, service).
pub async fn service_with_writer_gate() -> (Arc<MemoryStore>, Arc<FakeRemote>, Arc<SyncService>) {
    let store = Arc::new(MemoryStore::new());
    let remote = FakeRemote::new();
    let service = SyncService::new(store.clone(), remote.clone(), FakeGate::writer())
        .await
        .unwrap();
    (store, remote, Arc::new(service))
}

/// Persist a document into the local store through the service.
pub async fn seed_local(service: &SyncService, document: &Document) {
    service.save_document(document).await.unwrap();
}
