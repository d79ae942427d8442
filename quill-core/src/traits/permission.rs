//! Operating-mode gate. Mutating operations on this core are no-ops
//! outside write-enabled mode.

use serde::{Deserialize, Serialize};

/// Whether the current session may mutate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    ReadOnly,
    WriteEnabled,
}

/// External authentication/mode provider.
pub trait PermissionGate: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn current_mode(&self) -> AccessMode;
}
