//! Namespaced storage keys and system-wide limits.

/// Document format version written into `metadata.version`.
pub const DOCUMENT_FORMAT_VERSION: &str = "1.0";

/// Maximum number of sync history entries retained (oldest evicted).
pub const MAX_SYNC_HISTORY_ENTRIES: usize = 50;

/// Maximum number of pre-repair backups retained (oldest evicted).
pub const MAX_REPAIR_BACKUPS: usize = 10;

/// Local store key namespace.
pub mod keys {
    pub const RESOURCES: &str = "quill.resources";
    pub const QUESTIONS: &str = "quill.questions";
    pub const SUB_QUESTIONS: &str = "quill.subQuestions";
    pub const ANSWERS: &str = "quill.answers";
    pub const METADATA: &str = "quill.metadata";
    pub const PENDING_CHANGES: &str = "quill.pendingChanges";
    pub const SYNC_HISTORY: &str = "quill.syncHistory";
    pub const PREFERENCES: &str = "quill.preferences";
    pub const SYNC_BASE: &str = "quill.sync.base";
    pub const LAST_SYNC_TIME: &str = "quill.sync.lastSyncTime";
    pub const LAST_PUSH_HASH: &str = "quill.sync.lastPushHash";
    pub const REMOTE_HANDLE: &str = "quill.sync.remoteHandle";
    pub const REPAIR_BACKUPS: &str = "quill.repair.backups";
    pub const ISOLATED_ITEMS: &str = "quill.repair.isolatedItems";
}
