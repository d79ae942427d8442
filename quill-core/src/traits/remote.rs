//! The versioned remote document store, seen through a narrow client trait.
//!
//! Credential storage and the HTTP mechanics live behind the
//! implementation; this core only sees payloads and version metadata.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::QuillResult;

/// Identity of a created remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHandle {
    pub id: String,
    pub url: String,
}

/// Additions/deletions recorded for one remote version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub additions: usize,
    pub deletions: usize,
}

/// One prior version of the remote document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: String,
    #[serde(rename = "committedAt")]
    pub committed_at: DateTime<Utc>,
    #[serde(rename = "changeStats")]
    pub change_stats: ChangeStats,
}

/// The current remote payload plus its version history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub payload: Value,
    pub versions: Vec<VersionInfo>,
}

/// Client for the single versioned JSON document backing this system.
/// Every write produces a new remote version.
#[async_trait]
pub trait RemoteDocumentClient: Send + Sync {
    /// Create the remote document.
    async fn create(&self, payload: &Value) -> QuillResult<RemoteHandle>;

    /// Replace the document content, producing a new version.
    async fn update(&self, id: &str, payload: &Value) -> QuillResult<VersionInfo>;

    /// Fetch the current payload and version list.
    async fn get(&self, id: &str) -> QuillResult<RemoteDocument>;

    /// Fetch the payload of one prior version.
    async fn get_version(&self, id: &str, version_id: &str) -> QuillResult<Value>;
}
