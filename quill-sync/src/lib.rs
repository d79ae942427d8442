//! # quill-sync
//!
//! Synchronization core: the durable pending change queue, local/remote
//! comparison, conflict detection and entity-level merge, single-flight
//! scheduling, and the sync service facade tying them together.

pub mod comparator;
pub mod conflict;
pub mod coordinator;
pub mod history;
pub mod queue;
pub mod service;
pub mod status;

pub use conflict::{ConflictInfo, MergeOutcome, MergeStrategy};
pub use coordinator::SyncCoordinator;
pub use queue::PendingChangeQueue;
pub use history::SyncHistory;
pub use service::{BidirectionalReport, PushOutcome, PushReport, SyncService};
pub use status::{SyncStatus, SyncStatusCell};
