//! # quill-repair
//!
//! Structural validation and repair of the document before it can corrupt
//! the remote copy. Pipeline: detect -> plan -> (preview) -> apply ->
//! (isolate) -> report, plus the integration that chains a clean repair
//! into a push.

pub mod analyzer;
pub mod backup;
pub mod detector;
pub mod integration;
pub mod repairer;
pub mod reporter;

pub use analyzer::analyze_errors;
pub use backup::BackupStore;
pub use detector::detect_errors;
pub use integration::{RepairSyncIntegration, RepairSyncReport};
pub use repairer::{apply_repairs, RepairOutcome};
