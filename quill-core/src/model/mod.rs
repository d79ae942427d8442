//! Data model: entities, the aggregate document, pending changes,
//! statistics, sync history, and repair types.

pub mod change;
pub mod document;
pub mod entity;
pub mod repair;
pub mod stats;

pub use change::{ChangeType, PendingChange};
pub use document::{Document, DocumentMetadata};
pub use entity::{Answer, BigQuestion, EntityKind, QuestionStatus, Resource, SubQuestion, SyncEntity};
pub use repair::{
    DataLossEstimate, DetectionResult, IsolatedItem, RepairAction, RepairOperation, RepairPlan,
    Severity, ValidationError,
};
pub use stats::{
    ChangeCounts, ComparisonResult, DataStatistics, SyncHistoryEntry, SyncHistoryType,
    SyncRecommendation,
};
