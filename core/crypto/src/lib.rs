//! Cryptographic primitives for pinvault.
//!
//! This module provides:
//! - Secure random bytes and hex encoding
//! - SHA-256 hashing for PIN verification
//! - Key derivation using PBKDF2-HMAC-SHA-256
//! - Authenticated encryption using AES-256-GCM
//!
//! # Security Guarantees
//! - Session keys are zeroized on drop and cannot be serialized
//! - No plaintext or key material is ever logged
//! - Digest comparison is constant-time

pub mod aead;
pub mod encoding;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod random;

pub use aead::{decrypt, encrypt, Sealed};
pub use encoding::{from_hex, to_hex};
pub use hash::{digests_match, hash};
pub use kdf::{derive_key, KdfParams};
pub use keys::{Iv, Salt, SessionKey};
pub use random::random_bytes;
