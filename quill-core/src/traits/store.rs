//! Generic async key-value persistence.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::QuillResult;

/// Async key-value store holding entity collections, the pending queue,
/// history, and preferences under the namespaced keys in
/// [`crate::constants::keys`].
///
/// Implementations are expected to serialize access; this core never issues
/// concurrent writes to the same key.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> QuillResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> QuillResult<()>;
    async fn remove(&self, key: &str) -> QuillResult<()>;
}
