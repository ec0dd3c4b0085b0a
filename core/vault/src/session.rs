//! Vault session management.
//!
//! A session owns the derived key and the decrypted records while the vault
//! is unlocked. Locking or dropping the session zeroizes the key and clears
//! the records.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::manager::VaultManager;
use crate::record::PlaintextRecord;
use pinvault_common::{Error, RecordId, Result};
use pinvault_crypto::SessionKey;

/// State of the vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Key is held and records are readable.
    Unlocked,
    /// No key is held.
    Locked,
}

/// Scoped holder of a session key.
///
/// Every mutation is persisted through [`VaultManager::save_records`] before
/// the in-memory list changes, so the list always mirrors the store.
pub struct VaultSession {
    manager: Arc<VaultManager>,
    key: Option<SessionKey>,
    records: Vec<PlaintextRecord>,
}

impl VaultSession {
    /// Create a locked session.
    pub fn new(manager: Arc<VaultManager>) -> Self {
        Self {
            manager,
            key: None,
            records: Vec::new(),
        }
    }

    /// Unlock with a PIN and load the records.
    ///
    /// # Errors
    /// - `IncorrectPin` if the PIN is wrong or no vault exists; the session
    ///   stays locked
    pub async fn unlock(&mut self, pin: &str) -> Result<()> {
        let key = self.manager.unlock(pin).await?;
        let records = self.manager.load_records(&key).await?;

        self.lock();
        self.key = Some(key);
        self.records = records;

        info!(records = self.records.len(), "Session unlocked");
        Ok(())
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        if self.key.is_some() {
            SessionState::Unlocked
        } else {
            SessionState::Locked
        }
    }

    /// Check if the session holds a key.
    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    fn key(&self) -> Result<&SessionKey> {
        self.key.as_ref().ok_or(Error::Locked)
    }

    /// Decrypted records, newest additions first.
    ///
    /// # Errors
    /// - `Locked` if the session is locked
    pub fn records(&self) -> Result<&[PlaintextRecord]> {
        self.key()?;
        Ok(&self.records)
    }

    /// Find a record by id.
    pub fn record(&self, id: &RecordId) -> Result<Option<&PlaintextRecord>> {
        Ok(self.records()?.iter().find(|r| &r.id == id))
    }

    async fn commit(&mut self, records: Vec<PlaintextRecord>) -> Result<()> {
        let key = self.key()?;
        self.manager.save_records(&records, key).await?;
        self.records = records;
        Ok(())
    }

    /// Create a record and put it at the front of the list.
    ///
    /// # Errors
    /// - `Locked` if the session is locked
    /// - `InvalidInput` if `account` or `secret` is blank
    pub async fn add_record(&mut self, account: &str, secret: &str) -> Result<RecordId> {
        self.key()?;
        let record = PlaintextRecord::new(account, secret)?;
        let id = record.id.clone();

        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(record);
        records.extend(self.records.iter().cloned());
        self.commit(records).await?;

        debug!(id = %id, "Record added");
        Ok(id)
    }

    /// Replace the label and secret of an existing record.
    ///
    /// # Errors
    /// - `InvalidInput` if the record does not exist or a field is blank
    pub async fn update_record(&mut self, id: &RecordId, account: &str, secret: &str) -> Result<()> {
        self.key()?;
        let mut records = self.records.clone();
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::InvalidInput(format!("Record not found: {}", id)))?;
        record.update(account, secret)?;
        self.commit(records).await?;

        debug!(id = %id, "Record updated");
        Ok(())
    }

    /// Delete a record.
    ///
    /// # Returns
    /// `false` if no record had that id.
    pub async fn delete_record(&mut self, id: &RecordId) -> Result<bool> {
        self.key()?;
        if !self.records.iter().any(|r| &r.id == id) {
            return Ok(false);
        }

        let records = self.records.iter().filter(|r| &r.id != id).cloned().collect();
        self.commit(records).await?;

        debug!(id = %id, "Record deleted");
        Ok(true)
    }

    /// Re-read the records from the store.
    pub async fn reload(&mut self) -> Result<()> {
        let records = self.manager.load_records(self.key()?).await?;
        self.records = records;
        Ok(())
    }

    /// Change the PIN, re-encrypting every stored record, and adopt the new
    /// key without a fresh unlock.
    ///
    /// The old key is discarded as soon as the rotation is stored. It can no
    /// longer be derived from any PIN, so it must never encrypt again.
    ///
    /// # Returns
    /// Number of records dropped because they could not be decrypted.
    ///
    /// # Errors
    /// - `Locked` if the session is locked
    /// - `IncorrectOldPin` if `old_pin` is wrong
    /// - `InvalidPin` if `new_pin` is not four digits
    /// - Storage errors from re-reading the records; the PIN has changed and
    ///   the session is left locked
    pub async fn change_pin(&mut self, old_pin: &str, new_pin: &str) -> Result<usize> {
        self.key()?;
        let rotation = self.manager.rotate_pin(old_pin, new_pin).await?;
        let dropped = rotation.dropped;
        self.key = Some(rotation.key);

        match self.manager.load_records(self.key()?).await {
            Ok(records) => {
                self.records = records;
                Ok(dropped)
            }
            Err(e) => {
                warn!(error = %e, "Reload after PIN change failed; locking session");
                self.lock();
                Err(e)
            }
        }
    }

    /// Lock the session, clearing the key and the records from memory.
    pub fn lock(&mut self) {
        if let Some(key) = self.key.take() {
            // Zeroized on drop via ZeroizeOnDrop
            drop(key);
        }
        self.records.clear();
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;
    use async_trait::async_trait;
    use pinvault_crypto::KdfParams;
    use pinvault_storage::{KeyValueStore, MemoryStore};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose collection reads start failing once a rotation
    /// journal has been removed.
    #[derive(Default)]
    struct ReloadFailingStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for ReloadFailingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            if key == "data" && self.failing.load(Ordering::SeqCst) {
                return Err(Error::Storage("read failed".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<()> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await?;
            if key.ends_with(".rotation") {
                self.failing.store(true, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    async fn create_test_session() -> VaultSession {
        let manager = VaultManager::new(
            Arc::new(MemoryStore::new()),
            VaultConfig::with_kdf_params(KdfParams::testing()),
        )
        .unwrap();
        manager.setup_pin("1234").await.unwrap();

        let mut session = VaultSession::new(Arc::new(manager));
        session.unlock("1234").await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_session_creation() {
        let session = create_test_session().await;
        assert!(session.is_unlocked());
        assert!(session.records().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_lock() {
        let mut session = create_test_session().await;
        session.add_record("Mail", "x").await.unwrap();
        session.lock();

        assert_eq!(session.state(), SessionState::Locked);
        assert!(matches!(session.records(), Err(Error::Locked)));
        assert!(matches!(
            session.add_record("Bank", "y").await,
            Err(Error::Locked)
        ));
    }

    #[tokio::test]
    async fn test_wrong_pin_stays_locked() {
        let mut session = create_test_session().await;
        session.lock();

        assert!(matches!(session.unlock("9999").await, Err(Error::IncorrectPin)));
        assert!(!session.is_unlocked());
    }

    #[tokio::test]
    async fn test_add_prepends() {
        let mut session = create_test_session().await;
        let first = session.add_record("First", "1").await.unwrap();
        let second = session.add_record("Second", "2").await.unwrap();

        let ids: Vec<_> = session.records().unwrap().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_update_record() {
        let mut session = create_test_session().await;
        let id = session.add_record("Mail", "old").await.unwrap();

        session.update_record(&id, "Mail", "new").await.unwrap();
        session.reload().await.unwrap();

        assert_eq!(session.record(&id).unwrap().unwrap().secret, "new");
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let mut session = create_test_session().await;
        let missing = RecordId::new("missing").unwrap();

        assert!(matches!(
            session.update_record(&missing, "a", "b").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_state() {
        let mut session = create_test_session().await;
        let id = session.add_record("Mail", "old").await.unwrap();

        assert!(session.update_record(&id, "Mail", " ").await.is_err());
        assert_eq!(session.record(&id).unwrap().unwrap().secret, "old");
    }

    #[tokio::test]
    async fn test_delete_record() {
        let mut session = create_test_session().await;
        let id = session.add_record("Mail", "x").await.unwrap();
        session.add_record("Bank", "y").await.unwrap();

        assert!(session.delete_record(&id).await.unwrap());
        assert!(!session.delete_record(&id).await.unwrap());

        session.reload().await.unwrap();
        assert_eq!(session.records().unwrap().len(), 1);
        assert!(session.record(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_pin() {
        let mut session = create_test_session().await;
        session.add_record("Mail", "x").await.unwrap();

        let dropped = session.change_pin("1234", "5678").await.unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(session.records().unwrap().len(), 1);

        // Adopted key keeps working for writes
        session.add_record("Bank", "y").await.unwrap();

        session.lock();
        assert!(session.unlock("1234").await.is_err());
        session.unlock("5678").await.unwrap();
        assert_eq!(session.records().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_change_pin_reload_failure_never_writes_with_old_key() {
        let store = Arc::new(ReloadFailingStore::default());
        let manager = VaultManager::new(
            store.clone(),
            VaultConfig::with_kdf_params(KdfParams::testing()),
        )
        .unwrap();
        manager.setup_pin("1234").await.unwrap();
        let mut session = VaultSession::new(Arc::new(manager));
        session.unlock("1234").await.unwrap();
        session.add_record("Mail", "x").await.unwrap();

        assert!(matches!(
            session.change_pin("1234", "5678").await,
            Err(Error::Storage(_))
        ));
        assert!(!session.is_unlocked());
        assert!(matches!(
            session.add_record("Bank", "y").await,
            Err(Error::Locked)
        ));

        store.failing.store(false, Ordering::SeqCst);
        session.unlock("5678").await.unwrap();
        let records = session.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].account, "Mail");
    }
}
