//! Persisted and in-memory record types.
//!
//! `AuthRecord` and `EncryptedRecord` are the only shapes that reach the
//! store, and they serialize with the exact field names of the stored JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use pinvault_common::{Error, RecordId, Result};
use pinvault_crypto::{hash, Iv, Salt};

/// Salted PIN verifier, stored once per vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    /// Hex-encoded 16-byte salt.
    pub salt: String,
    /// Hex SHA-256 of the PIN followed by the hex salt.
    pub auth_hash: String,
}

impl AuthRecord {
    /// Build a record for `pin` under a fresh salt.
    pub fn generate(pin: &str) -> Result<Self> {
        let salt = Salt::generate()?.to_hex();
        let auth_hash = Self::hash_pin(pin, &salt);
        Ok(Self { salt, auth_hash })
    }

    /// Verifier digest for `pin` against a stored hex salt.
    pub fn hash_pin(pin: &str, salt_hex: &str) -> String {
        let mut input = String::with_capacity(pin.len() + salt_hex.len());
        input.push_str(pin);
        input.push_str(salt_hex);
        let digest = hash(&input);
        input.zeroize();
        digest
    }

    /// Parsed salt.
    ///
    /// # Errors
    /// - `Serialization` if the stored salt is not 16 bytes of hex
    pub fn salt(&self) -> Result<Salt> {
        Salt::from_hex(&self.salt)
            .map_err(|e| Error::Serialization(format!("Corrupt auth salt: {}", e)))
    }

    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the stored JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One encrypted record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// Identifier of the plaintext record, stored in the clear.
    pub id: RecordId,
    /// Hex-encoded 12-byte nonce.
    pub iv: String,
    /// Hex-encoded ciphertext with the GCM tag appended.
    pub cipher: String,
}

impl EncryptedRecord {
    /// Parsed nonce.
    pub fn iv(&self) -> Result<Iv> {
        Iv::from_hex(&self.iv)
    }
}

/// A decrypted note. Never persisted in this form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PlaintextRecord {
    /// Stable identifier.
    #[zeroize(skip)]
    pub id: RecordId,
    /// Account label.
    pub account: String,
    /// Sensitive payload.
    pub secret: String,
    /// Creation or last modification instant.
    #[zeroize(skip)]
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl PlaintextRecord {
    /// Create a record with a fresh id and the current time.
    ///
    /// # Errors
    /// - `InvalidInput` if `account` or `secret` is blank
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let record = Self {
            id: RecordId::generate(),
            account: account.into(),
            secret: secret.into(),
            timestamp: Utc::now(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Replace the label and payload, refreshing the timestamp.
    pub fn update(&mut self, account: impl Into<String>, secret: impl Into<String>) -> Result<()> {
        let account = account.into();
        let secret = secret.into();
        check_field("account", &account)?;
        check_field("secret", &secret)?;

        self.account.zeroize();
        self.secret.zeroize();
        self.account = account;
        self.secret = secret;
        self.timestamp = Utc::now();
        Ok(())
    }

    /// Check that `account` and `secret` are non-blank.
    pub fn validate(&self) -> Result<()> {
        check_field("account", &self.account)?;
        check_field("secret", &self.secret)
    }
}

fn check_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} cannot be empty", name)));
    }
    Ok(())
}

impl fmt::Debug for PlaintextRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaintextRecord")
            .field("id", &self.id)
            .field("account", &self.account)
            .field("secret", &"[REDACTED]")
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Staged outcome of a rotation, stored before `auth` and `data` are touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RotationJournal {
    pub auth: AuthRecord,
    pub data: Vec<EncryptedRecord>,
}
