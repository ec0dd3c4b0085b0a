//! In-memory key-value store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::store::{validate_key, KeyValueStore};
use pinvault_common::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    /// Remaining writes before every write fails; `None` means unlimited.
    writes_left: Option<usize>,
}

/// In-memory store.
///
/// Useful for testing and for embedding. All data is lost on drop. Clones
/// share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `n` more successful writes, then fail every `set` and `remove`.
    ///
    /// Simulates a process dying or a disk filling up partway through a
    /// multi-key update.
    pub fn fail_writes_after(&self, n: usize) {
        if let Ok(mut inner) = self.inner.write() {
            inner.writes_left = Some(n);
        }
    }

    /// Clear any injected write failure.
    pub fn heal(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.writes_left = None;
        }
    }

    /// Copy of all stored values.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner
            .read()
            .map(|inner| inner.values.clone())
            .unwrap_or_default()
    }

    fn write<F>(&self, key: &str, op: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        validate_key(key)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Error::Storage("Memory store lock poisoned".to_string()))?;

        let writes_left = inner.writes_left;
        match writes_left {
            Some(0) => {
                return Err(Error::Storage(format!("Injected write failure on '{}'", key)));
            }
            Some(n) => inner.writes_left = Some(n - 1),
            None => {}
        }

        op(&mut inner.values);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let inner = self
            .inner
            .read()
            .map_err(|_| Error::Storage("Memory store lock poisoned".to_string()))?;
        Ok(inner.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.write(key, |values| {
            values.insert(key.to_string(), value);
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.write(key, |values| {
            values.remove(key);
        })
    }
}
