//! Key-value store trait definition.

use async_trait::async_trait;

use pinvault_common::{Error, Result};

/// String key-value store backing a vault.
///
/// Implementations must make each `set` atomic for its key: a reader sees
/// either the previous value or the new one, never a mix.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Returns
    /// `None` when the key has never been set or was removed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove a key. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Check that a key is usable by every backend.
///
/// Keys must be non-empty, contain no path separators and not start with a dot.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("Store key cannot be empty".to_string()));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(Error::InvalidInput(
            "Store key cannot contain separators".to_string(),
        ));
    }
    if key.starts_with('.') {
        return Err(Error::InvalidInput(
            "Store key cannot start with '.'".to_string(),
        ));
    }
    Ok(())
}
