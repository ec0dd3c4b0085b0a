//! Authenticated encryption using AES-256-GCM.
//!
//! Every call to [`encrypt`] draws a fresh 96-bit nonce from the OS RNG.
//! Any tag mismatch on [`decrypt`] is reported as `AuthenticationFailed`;
//! no partial plaintext is ever returned.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};

use crate::keys::{Iv, SessionKey};
use pinvault_common::{Error, Result, SensitiveBytes};

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Output of [`encrypt`]: the nonce and the ciphertext with its tag appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Nonce used for this encryption. Not secret.
    pub iv: Iv,
    /// Ciphertext followed by the 16-byte tag.
    pub ciphertext: Vec<u8>,
}

fn cipher(key: &SessionKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt plaintext under `key` with a freshly drawn nonce.
///
/// # Postconditions
/// - Ciphertext length is plaintext length + TAG_SIZE
/// - Two calls with identical inputs produce different nonces and ciphertexts
///
/// # Errors
/// - `EntropyUnavailable` if no nonce can be drawn
pub fn encrypt(plaintext: &[u8], key: &SessionKey) -> Result<Sealed> {
    let iv = Iv::generate()?;

    let ciphertext = cipher(key)
        .encrypt(Nonce::from_slice(iv.as_bytes()), plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    Ok(Sealed { iv, ciphertext })
}

/// Decrypt and verify ciphertext produced by [`encrypt`].
///
/// # Errors
/// - `AuthenticationFailed` on a wrong key, wrong nonce, truncated or
///   modified ciphertext
pub fn decrypt(ciphertext: &[u8], iv: &Iv, key: &SessionKey) -> Result<SensitiveBytes> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::AuthenticationFailed);
    }

    cipher(key)
        .decrypt(Nonce::from_slice(iv.as_bytes()), ciphertext)
        .map(SensitiveBytes::new)
        .map_err(|_| Error::AuthenticationFailed)
}
