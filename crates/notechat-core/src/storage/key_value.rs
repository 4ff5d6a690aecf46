//! Key-value storage trait.
//!
//! Defines the string-keyed persistence capability that backs every store.

use async_trait::async_trait;

use crate::error::Result;

/// Storage key for the currently loaded markdown document.
pub const SESSION_MARKDOWN_KEY: &str = "@session_markdown";

/// Storage key for the last opened session path.
pub const SESSION_LAST_PATH_KEY: &str = "@session_last_path";

/// Storage key for the serialized conversation map.
pub const CONVERSATION_STORAGE_KEY: &str = "conversation-storage";

/// An asynchronous, string-keyed persistence backend.
///
/// Implementations are assumed reliable but fallible: callers in this
/// workspace treat a failed read as "no data" and a failed write as a
/// dropped write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Value found
    /// - `Ok(None)`: Nothing stored under the key
    /// - `Err(_)`: Error occurred during retrieval
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the value stored under `key` (no error if absent).
    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every stored value.
    async fn clear(&self) -> Result<()>;
}
