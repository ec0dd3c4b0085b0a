//! Key derivation using PBKDF2-HMAC-SHA-256.
//!
//! The iteration count makes each guess at a 4-digit PIN expensive. The
//! derivation is deterministic, so verification and decryption can each
//! derive the same key independently.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::keys::{Salt, SessionKey, KEY_LENGTH};
use pinvault_common::{Error, Result};

/// Iteration count used for real vaults.
pub const STANDARD_ITERATIONS: u32 = 100_000;

/// Parameters for PBKDF2 key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Number of HMAC-SHA-256 iterations.
    pub iterations: u32,
}

impl KdfParams {
    /// Parameters for real vaults: 100,000 iterations.
    pub fn standard() -> Self {
        Self {
            iterations: STANDARD_ITERATIONS,
        }
    }

    /// Cheap parameters for tests. Never use these for stored data.
    pub fn testing() -> Self {
        Self { iterations: 1_000 }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derive a session key from a PIN and salt.
///
/// # Preconditions
/// - `pin` must not be empty
/// - `params.iterations` must be non-zero
///
/// # Postconditions
/// - Returns a 256-bit AES key
/// - The same inputs always produce the same key
///
/// # Security
/// - The intermediate buffer is zeroized
pub fn derive_key(pin: &[u8], salt: &Salt, params: &KdfParams) -> Result<SessionKey> {
    if pin.is_empty() {
        return Err(Error::InvalidInput("PIN cannot be empty".to_string()));
    }
    if params.iterations == 0 {
        return Err(Error::Crypto(
            "Invalid KDF parameters: iterations must be non-zero".to_string(),
        ));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(pin, salt.as_bytes(), params.iterations, &mut key_bytes);

    let key = SessionKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}
