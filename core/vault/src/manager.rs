//! Vault manager: PIN setup, verification, record encryption and rotation.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::config::VaultConfig;
use crate::pin::validate_pin_format;
use crate::record::{AuthRecord, EncryptedRecord, PlaintextRecord, RotationJournal};
use pinvault_common::{Error, Result, SensitiveBytes};
use pinvault_crypto::{
    decrypt, derive_key, digests_match, encrypt, from_hex, to_hex, Salt, SessionKey,
};
use pinvault_storage::KeyValueStore;

/// Outcome of [`VaultManager::validate_pin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinCheck {
    /// PIN matches; carries the salt needed to derive the session key.
    Valid(Salt),
    /// PIN does not match, or the vault is not set up.
    Invalid,
}

impl PinCheck {
    /// Whether the PIN verified.
    pub fn is_valid(&self) -> bool {
        matches!(self, PinCheck::Valid(_))
    }

    /// Salt, if the PIN verified.
    pub fn salt(&self) -> Option<&Salt> {
        match self {
            PinCheck::Valid(salt) => Some(salt),
            PinCheck::Invalid => None,
        }
    }
}

/// Result of a successful PIN rotation.
#[derive(Debug)]
pub struct Rotation {
    /// Session key derived from the new PIN. The caller becomes its owner.
    pub key: SessionKey,
    /// Records that could not be decrypted under the old key and were
    /// therefore not carried over.
    pub dropped: usize,
}

/// What became of a rotation journal found in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    /// No journal was present.
    Clean,
    /// The new AuthRecord was never installed; the journal was discarded.
    RolledBack,
    /// The new AuthRecord was installed; the collection was written too.
    Completed,
}

/// Vault manager.
///
/// Sole writer of the authentication record and the encrypted record
/// collection. Never keeps a session key: keys are returned to the caller.
pub struct VaultManager {
    store: Arc<dyn KeyValueStore>,
    config: VaultConfig,
    /// Serializes every write path (setup, save, rotation, recovery).
    in_flight: Mutex<()>,
}

impl VaultManager {
    /// Create a manager over a store without touching it.
    ///
    /// # Errors
    /// - Invalid configuration
    pub fn new(store: Arc<dyn KeyValueStore>, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            in_flight: Mutex::new(()),
        })
    }

    /// Create a manager and replay any rotation interrupted before it
    /// finished.
    pub async fn open(store: Arc<dyn KeyValueStore>, config: VaultConfig) -> Result<Self> {
        let manager = Self::new(store, config)?;
        manager.recover().await?;
        Ok(manager)
    }

    /// True iff an authentication record exists.
    pub async fn is_setup(&self) -> Result<bool> {
        Ok(self.store.get(&self.config.auth_key).await?.is_some())
    }

    /// Configure the vault's first PIN.
    ///
    /// # Preconditions
    /// - No PIN is configured yet
    ///
    /// # Postconditions
    /// - A fresh salt and verifier are stored
    /// - An empty record collection exists if none did
    ///
    /// # Errors
    /// - `InvalidPin` if the PIN is not four digits
    /// - `AlreadyInitialized` if a PIN is configured; use
    ///   [`rotate_pin`](Self::rotate_pin) to change it
    /// - `EntropyUnavailable` if no salt can be drawn
    pub async fn setup_pin(&self, pin: &str) -> Result<()> {
        validate_pin_format(pin)?;
        let _guard = self.in_flight.lock().await;

        if self.is_setup().await? {
            return Err(Error::AlreadyInitialized);
        }

        self.install_pin(pin).await?;
        info!("Vault PIN configured");
        Ok(())
    }

    /// Overwrite the authentication record. Callers hold the guard.
    async fn install_pin(&self, pin: &str) -> Result<()> {
        let auth = AuthRecord::generate(pin)?;
        self.store
            .set(&self.config.auth_key, auth.to_json()?)
            .await?;

        if self.store.get(&self.config.data_key).await?.is_none() {
            self.store
                .set(&self.config.data_key, "[]".to_string())
                .await?;
        }

        Ok(())
    }

    async fn read_auth(&self) -> Result<Option<AuthRecord>> {
        match self.store.get(&self.config.auth_key).await? {
            Some(json) => Ok(Some(AuthRecord::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Check a PIN against the stored verifier.
    ///
    /// A missing vault and a wrong PIN both report `Invalid`. The digest
    /// comparison does not exit early.
    ///
    /// # Errors
    /// - `Serialization` if the stored record is corrupt
    pub async fn validate_pin(&self, pin: &str) -> Result<PinCheck> {
        let Some(auth) = self.read_auth().await? else {
            return Ok(PinCheck::Invalid);
        };

        let candidate = AuthRecord::hash_pin(pin, &auth.salt);
        if digests_match(&candidate, &auth.auth_hash) {
            Ok(PinCheck::Valid(auth.salt()?))
        } else {
            Ok(PinCheck::Invalid)
        }
    }

    /// Derive the session key for `pin` and `salt` off the async executor.
    pub async fn derive_session_key(&self, pin: &str, salt: &Salt) -> Result<SessionKey> {
        let pin = Zeroizing::new(pin.to_owned());
        let salt = salt.clone();
        let params = self.config.kdf_params;

        tokio::task::spawn_blocking(move || derive_key(pin.as_bytes(), &salt, &params))
            .await
            .map_err(|e| Error::Crypto(format!("Key derivation task failed: {}", e)))?
    }

    /// Verify `pin` and derive the session key.
    ///
    /// Settles a leftover rotation journal first, so the key always matches
    /// the collection that will be read with it.
    ///
    /// # Errors
    /// - `IncorrectPin` if the PIN does not verify or no vault exists
    pub async fn unlock(&self, pin: &str) -> Result<SessionKey> {
        self.recover().await?;

        match self.validate_pin(pin).await? {
            PinCheck::Valid(salt) => {
                let key = self.derive_session_key(pin, &salt).await?;
                debug!("Vault unlocked");
                Ok(key)
            }
            PinCheck::Invalid => {
                info!("Unlock rejected");
                Err(Error::IncorrectPin)
            }
        }
    }

    async fn read_collection(&self) -> Result<Vec<EncryptedRecord>> {
        match self.store.get(&self.config.data_key).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Decrypt every stored record under `key`.
    ///
    /// A record that fails to decrypt or parse is logged and skipped. The
    /// rest are returned in storage order.
    ///
    /// # Errors
    /// - `Serialization` if the collection itself is not valid JSON
    pub async fn load_records(&self, key: &SessionKey) -> Result<Vec<PlaintextRecord>> {
        let (records, _) = self.load_counting(key).await?;
        Ok(records)
    }

    async fn load_counting(&self, key: &SessionKey) -> Result<(Vec<PlaintextRecord>, usize)> {
        let stored = self.read_collection().await?;
        let total = stored.len();

        let mut records = Vec::with_capacity(total);
        for entry in &stored {
            match open_record(entry, key) {
                Ok(record) => records.push(record),
                Err(e) => warn!(id = %entry.id, error = %e, "Skipping undecryptable record"),
            }
        }

        let dropped = total - records.len();
        debug!(loaded = records.len(), dropped, "Records loaded");
        Ok((records, dropped))
    }

    /// Encrypt and store the full record collection, replacing the old one.
    ///
    /// The whole new collection is built in memory and written with a single
    /// `set`, so readers see either the old collection or the new one.
    ///
    /// # Errors
    /// - `InvalidInput` if a record has a blank field or ids repeat
    /// - `EntropyUnavailable` if a nonce cannot be drawn
    /// - `PinRotated` if an interrupted rotation had to be completed first;
    ///   `key` belongs to the old PIN and nothing is written
    pub async fn save_records(&self, records: &[PlaintextRecord], key: &SessionKey) -> Result<()> {
        let sealed = seal_all(records, key)?;
        let json = serde_json::to_string(&sealed)?;

        let _guard = self.in_flight.lock().await;
        if self.settle_journal().await? == Settled::Completed {
            warn!("Save refused: key predates a completed PIN rotation");
            return Err(Error::PinRotated);
        }
        self.store.set(&self.config.data_key, json).await?;

        debug!(count = sealed.len(), "Records saved");
        Ok(())
    }

    /// Change the PIN and re-encrypt every record under the new key.
    ///
    /// Records that do not decrypt under the old key are dropped and
    /// counted in [`Rotation::dropped`].
    ///
    /// The new verifier and the re-encrypted collection are first written
    /// together to a journal key, then applied. A failed apply is settled
    /// on the spot when the store allows it: rolled back if the new verifier
    /// never landed, completed if it did. Otherwise the journal stays and
    /// [`recover`](Self::recover) settles it the same way later.
    ///
    /// # Errors
    /// - `IncorrectOldPin` if `old_pin` does not verify (nothing is written)
    /// - `InvalidPin` if `new_pin` is not four digits (nothing is written)
    /// - Storage errors while applying; the old PIN stays active unless the
    ///   new verifier was already installed
    pub async fn rotate_pin(&self, old_pin: &str, new_pin: &str) -> Result<Rotation> {
        let _guard = self.in_flight.lock().await;
        self.settle_journal().await?;

        let old_salt = match self.validate_pin(old_pin).await? {
            PinCheck::Valid(salt) => salt,
            PinCheck::Invalid => {
                info!("Rotation rejected: old PIN did not verify");
                return Err(Error::IncorrectOldPin);
            }
        };
        validate_pin_format(new_pin)?;

        let old_key = self.derive_session_key(old_pin, &old_salt).await?;
        let (records, dropped) = self.load_counting(&old_key).await?;
        drop(old_key);

        if dropped > 0 {
            warn!(dropped, "Rotation continues without undecryptable records");
        }

        let auth = AuthRecord::generate(new_pin)?;
        let new_key = self.derive_session_key(new_pin, &auth.salt()?).await?;
        let data = seal_all(&records, &new_key)?;

        let journal = RotationJournal { auth, data };
        self.store
            .set(&self.config.journal_key(), serde_json::to_string(&journal)?)
            .await?;

        if let Err(e) = self.apply_journal(&journal).await {
            match self.settle_journal().await {
                Ok(Settled::Completed) => {
                    warn!(error = %e, "Rotation completed on retry");
                }
                Ok(_) => {
                    warn!(error = %e, "Rotation rolled back; old PIN still active");
                    return Err(e);
                }
                Err(cleanup) => {
                    error!(error = %e, cleanup = %cleanup, "Rotation interrupted; journal kept for recovery");
                    return Err(e);
                }
            }
        }

        info!(records = records.len(), dropped, "PIN rotated");
        Ok(Rotation {
            key: new_key,
            dropped,
        })
    }

    async fn apply_journal(&self, journal: &RotationJournal) -> Result<()> {
        self.store
            .set(&self.config.auth_key, journal.auth.to_json()?)
            .await?;
        self.finish_journal(journal).await
    }

    async fn finish_journal(&self, journal: &RotationJournal) -> Result<()> {
        self.store
            .set(&self.config.data_key, serde_json::to_string(&journal.data)?)
            .await?;
        self.store.remove(&self.config.journal_key()).await
    }

    /// Resolve a leftover journal against the stored verifier. Callers hold
    /// the guard.
    ///
    /// The stored AuthRecord decides: once the journal's verifier is
    /// installed the old PIN no longer works, so the rotation is finished.
    /// Before that the old PIN and collection are still authoritative and
    /// the journal is dropped.
    async fn settle_journal(&self) -> Result<Settled> {
        let journal_key = self.config.journal_key();
        let Some(json) = self.store.get(&journal_key).await? else {
            return Ok(Settled::Clean);
        };
        let journal: RotationJournal = serde_json::from_str(&json)?;

        if self.read_auth().await?.as_ref() == Some(&journal.auth) {
            self.finish_journal(&journal).await?;
            info!(records = journal.data.len(), "Completed interrupted PIN rotation");
            Ok(Settled::Completed)
        } else {
            self.store.remove(&journal_key).await?;
            info!("Discarded PIN rotation that never took effect");
            Ok(Settled::RolledBack)
        }
    }

    /// Settle a rotation that stopped after its journal was written.
    ///
    /// # Returns
    /// `true` if an interrupted rotation was completed, `false` if there was
    /// nothing to do or the rotation was rolled back.
    pub async fn recover(&self) -> Result<bool> {
        let _guard = self.in_flight.lock().await;
        Ok(self.settle_journal().await? == Settled::Completed)
    }
}

/// Serialize and encrypt one record with a fresh nonce.
fn seal_record(record: &PlaintextRecord, key: &SessionKey) -> Result<EncryptedRecord> {
    record.validate()?;
    let plaintext = SensitiveBytes::new(serde_json::to_vec(record)?);
    let sealed = encrypt(plaintext.as_bytes(), key)?;

    Ok(EncryptedRecord {
        id: record.id.clone(),
        iv: sealed.iv.to_hex(),
        cipher: to_hex(&sealed.ciphertext),
    })
}

fn seal_all(records: &[PlaintextRecord], key: &SessionKey) -> Result<Vec<EncryptedRecord>> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(&record.id) {
            return Err(Error::InvalidInput(format!(
                "Duplicate record id: {}",
                record.id
            )));
        }
    }

    records.iter().map(|r| seal_record(r, key)).collect()
}

/// Decrypt and parse one stored record.
fn open_record(entry: &EncryptedRecord, key: &SessionKey) -> Result<PlaintextRecord> {
    let iv = entry.iv()?;
    let ciphertext = from_hex(&entry.cipher)?;
    let plaintext = decrypt(&ciphertext, &iv, key)?;
    Ok(serde_json::from_slice(plaintext.as_bytes())?)
}
