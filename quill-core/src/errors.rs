//! Error taxonomy for the sync and repair subsystems.
//!
//! Every failure mode callers can react to gets its own variant with
//! structured fields. Partial progress (e.g. "8 of 10 repairs applied")
//! is carried in result structs, never lost to an early return.

use chrono::{DateTime, Utc};

/// Top-level error for all Quill operations.
#[derive(Debug, thiserror::Error)]
pub enum QuillError {
    /// Network failure talking to the remote document store. The pending
    /// change queue is preserved; the operation is retried on the next
    /// connectivity-restore signal or manual trigger.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// Credential invalid or expired. Sync is suspended until
    /// re-authentication.
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// A payload failed the five-key/container-kind document check.
    /// Aborts only the current operation; no data is mutated.
    #[error("malformed document payload: {}", problems.join("; "))]
    Shape { problems: Vec<String> },

    /// Local and remote histories diverged from the last common sync point.
    /// Non-fatal; routed to the conflict resolver.
    #[error("sync conflict: local lastSync {local_last_sync:?}, remote lastSync {remote_last_sync:?}")]
    Conflict {
        local_last_sync: Option<DateTime<Utc>>,
        remote_last_sync: Option<DateTime<Utc>>,
    },

    /// A single repair action failed to apply. Does not abort the batch.
    #[error("repair action {action_id} failed: {reason}")]
    Repair { action_id: String, reason: String },

    /// A mutating sync was requested while another is in flight.
    #[error("sync already in progress")]
    SyncInProgress,

    /// The local key-value store failed.
    #[error("local store error: {reason}")]
    Store { reason: String },
}

impl QuillError {
    /// Convenience constructor for shape errors with a single problem.
    pub fn shape(problem: impl Into<String>) -> Self {
        Self::Shape {
            problems: vec![problem.into()],
        }
    }

    /// Whether this error should leave the pending queue untouched for retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(err: serde_json::Error) -> Self {
        Self::shape(format!("JSON (de)serialization failed: {err}"))
    }
}

/// Result alias used across the workspace.
pub type QuillResult<T> = Result<T, QuillError>;
