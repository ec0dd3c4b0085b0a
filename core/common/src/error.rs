//! Common error types for pinvault.

use thiserror::Error;

/// Top-level error type for pinvault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// PIN is not exactly four ASCII digits.
    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    /// PIN did not verify, or no vault exists. The two cases are
    /// deliberately indistinguishable.
    #[error("Incorrect PIN")]
    IncorrectPin,

    /// The current PIN supplied to a rotation did not verify.
    #[error("Incorrect old PIN")]
    IncorrectOldPin,

    /// AEAD tag did not verify: wrong key, corrupted data or tampering.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The platform RNG could not be sourced.
    #[error("Entropy unavailable: {0}")]
    EntropyUnavailable(String),

    /// Persisted data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cryptographic misuse (bad key or nonce length, malformed hex).
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A PIN is already configured for this vault.
    #[error("Vault is already initialized")]
    AlreadyInitialized,

    /// The session holds no key.
    #[error("Session is locked")]
    Locked,

    /// The PIN changed while the caller held a key derived from the old one.
    #[error("PIN was changed; unlock again")]
    PinRotated,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
