//! Traits for the external collaborators this core is built against:
//! local persistence, the remote document store, and the permission gate.

pub mod permission;
pub mod remote;
pub mod store;

pub use permission::{AccessMode, PermissionGate};
pub use remote::{ChangeStats, RemoteDocument, RemoteDocumentClient, RemoteHandle, VersionInfo};
pub use store::LocalStore;
