//! Key material and the public values that travel with it.
//!
//! `SessionKey` zeroizes its memory on drop and has no serialization or
//! byte accessor outside this crate, so it cannot be written to storage.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::encoding::{from_hex_array, to_hex};
use crate::random::random_array;
use pinvault_common::Result;

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of key-derivation salts in bytes.
pub const SALT_LENGTH: usize = 16;

/// Length of AES-GCM nonces in bytes (96-bit).
pub const IV_LENGTH: usize = 12;

/// Symmetric key derived from a PIN and salt.
///
/// Held only in memory for an unlocked session. Not `Clone`: whoever holds
/// the value is its sole owner, and dropping it destroys the key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; KEY_LENGTH],
}

impl SessionKey {
    pub(crate) fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}

/// Salt for PIN hashing and key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    ///
    /// # Errors
    /// - `EntropyUnavailable` if the platform RNG fails
    pub fn generate() -> Result<Self> {
        Ok(Self(random_array()?))
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse the stored hex form.
    pub fn from_hex(text: &str) -> Result<Self> {
        Ok(Self(from_hex_array(text)?))
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }

    /// Lowercase hex form, as persisted and as mixed into the PIN hash.
    pub fn to_hex(&self) -> String {
        to_hex(self.0)
    }
}

/// AES-GCM nonce. Public, but must never repeat under one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iv([u8; IV_LENGTH]);

impl Iv {
    /// Draw a fresh random nonce.
    pub fn generate() -> Result<Self> {
        Ok(Self(random_array()?))
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; IV_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse the stored hex form.
    pub fn from_hex(text: &str) -> Result<Self> {
        Ok(Self(from_hex_array(text)?))
    }

    /// Get the nonce bytes.
    pub fn as_bytes(&self) -> &[u8; IV_LENGTH] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        to_hex(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate().unwrap();
        let salt2 = Salt::generate().unwrap();

        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_salt_hex_roundtrip() {
        let salt = Salt::from_bytes([0xA5; SALT_LENGTH]);
        let text = salt.to_hex();

        assert_eq!(text.len(), SALT_LENGTH * 2);
        assert_eq!(text, "a5".repeat(SALT_LENGTH));
        assert_eq!(Salt::from_hex(&text).unwrap(), salt);
    }

    #[test]
    fn test_salt_wrong_length_rejected() {
        assert!(Salt::from_hex("abcd").is_err());
    }

    #[test]
    fn test_iv_wrong_length_rejected() {
        assert!(Iv::from_hex(&"00".repeat(16)).is_err());
        assert!(Iv::from_hex(&"00".repeat(IV_LENGTH)).is_ok());
    }

    #[test]
    fn test_session_key_debug_redacted() {
        let key = SessionKey::from_bytes([7u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "SessionKey([REDACTED])");
    }
}
