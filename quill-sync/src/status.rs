//! Observable sync status.
//!
//! One explicit state object with subscribe semantics, instead of a
//! free-floating mutable global read by every UI surface.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The sync facade's status state machine:
/// `idle -> checking -> syncing -> idle`, with `error` reachable from
/// either active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Idle,
    Checking,
    Syncing,
    Error,
}

/// Shared status cell. Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct SyncStatusCell {
    tx: watch::Sender<SyncStatus>,
}

impl SyncStatusCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncStatus::Idle);
        Self { tx }
    }

    /// Current status.
    pub fn get(&self) -> SyncStatus {
        *self.tx.borrow()
    }

    /// Transition to a new status, notifying subscribers.
    pub fn set(&self, status: SyncStatus) {
        // send_replace never fails even with zero receivers.
        self.tx.send_replace(status);
    }

    /// Subscribe to status transitions.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }
}

impl Default for SyncStatusCell {
    fn default() -> Self {
        Self::new()
    }
}
