//! Persisted preferences and repair policy.

use serde::{Deserialize, Serialize};

/// Defaults shared between config structs.
pub mod defaults {
    pub const DEFAULT_PERIODIC_CHECK_INTERVAL_MS: u64 = 5 * 60 * 1000;
}

/// User-facing sync preferences, persisted through the LocalStore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPreferences {
    #[serde(rename = "autoSyncEnabled")]
    pub auto_sync_enabled: bool,
    #[serde(rename = "periodicCheckIntervalMs")]
    pub periodic_check_interval_ms: u64,
    #[serde(rename = "notifyOnConflict")]
    pub notify_on_conflict: bool,
}

impl Default for SyncPreferences {
    fn default() -> Self {
        Self {
            auto_sync_enabled: true,
            periodic_check_interval_ms: defaults::DEFAULT_PERIODIC_CHECK_INTERVAL_MS,
            notify_on_conflict: true,
        }
    }
}

/// Policy deciding which repairs may run unattended.
///
/// The safe-vs-destructive line is heuristic, so it is configuration
/// rather than hard-coded logic in the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairPolicy {
    /// Allow filling content-neutral defaults (timestamps, enum defaults,
    /// empty lists) without explicit selection.
    pub auto_fill_neutral_defaults: bool,
    /// Allow pruning dangling references without explicit selection.
    pub auto_prune_references: bool,
    /// Allow removing whole records without explicit selection.
    pub auto_remove_records: bool,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            auto_fill_neutral_defaults: true,
            auto_prune_references: false,
            auto_remove_records: false,
        }
    }
}
