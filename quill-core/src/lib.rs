//! # quill-core
//!
//! Foundation crate for the Quill synchronization and data-integrity system.
//! Defines all entity and document models, declarative entity schemas,
//! errors, config, constants, and the traits behind which the host
//! application plugs in its storage, remote client, and permission gate.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod model;
pub mod schema;
pub mod store;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{RepairPolicy, SyncPreferences};
pub use errors::{QuillError, QuillResult};
pub use model::{Document, DocumentMetadata, EntityKind, PendingChange, QuestionStatus};
pub use traits::{AccessMode, LocalStore, PermissionGate, RemoteDocumentClient};
