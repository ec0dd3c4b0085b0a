//! Local filesystem key-value store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::store::{validate_key, KeyValueStore};
use pinvault_common::Result;

/// File-backed store.
///
/// Each key is one file under the root directory. Writes go to a hidden
/// temporary file that is synced and then renamed over the target, so a
/// crash leaves either the old value or the new one.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory.
    ///
    /// # Postconditions
    /// - Root directory is created if it doesn't exist
    ///
    /// # Errors
    /// - Permission denied
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self { root })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{}.json.tmp", key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        match fs::read_to_string(self.value_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        validate_key(key)?;

        let temp = self.temp_path(key);
        let mut file = fs::File::create(&temp).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp, self.value_path(key)).await?;

        debug!(key, size = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        match fs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_set_get() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        assert_eq!(store.get("auth").await.unwrap(), None);

        store.set("auth", "{\"a\":1}".to_string()).await.unwrap();
        assert_eq!(
            store.get("auth").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
    }

    #[tokio::test]
    async fn test_file_overwrite_leaves_no_temp() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        store.set("data", "[]".to_string()).await.unwrap();
        store.set("data", "[1,2]".to_string()).await.unwrap();

        assert_eq!(store.get("data").await.unwrap().as_deref(), Some("[1,2]"));
        assert!(!store.temp_path("data").exists());
    }

    #[tokio::test]
    async fn test_file_remove() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        store.set("data", "[]".to_string()).await.unwrap();
        store.remove("data").await.unwrap();
        store.remove("data").await.unwrap();

        assert_eq!(store.get("data").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let temp = TempDir::new().unwrap();

        FileStore::new(temp.path())
            .unwrap()
            .set("auth", "x".to_string())
            .await
            .unwrap();

        let reopened = FileStore::new(temp.path()).unwrap();
        assert_eq!(reopened.get("auth").await.unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_creates_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("vault");

        let store = FileStore::new(&root).unwrap();
        assert!(store.root().is_dir());
    }
}
