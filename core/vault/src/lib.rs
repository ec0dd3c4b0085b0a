//! PIN-gated vault for small secret records.
//!
//! This module provides:
//! - PIN setup and verification against a salted hash
//! - Session key derivation and per-record encryption
//! - PIN rotation with full re-encryption, staged so an interruption can
//!   be replayed
//! - A session holder that owns the key for the duration of an unlock
//!
//! # Architecture
//! Callers talk to [`VaultManager`] (or the [`VaultSession`] wrapper). The
//! manager composes the crypto primitives and writes only salts, hashes,
//! nonces and ciphertext to the key-value store.

pub mod config;
pub mod manager;
pub mod pin;
pub mod record;
pub mod session;

pub use config::VaultConfig;
pub use manager::{PinCheck, Rotation, VaultManager};
pub use pin::validate_pin_format;
pub use record::{AuthRecord, EncryptedRecord, PlaintextRecord};
pub use session::{SessionState, VaultSession};
