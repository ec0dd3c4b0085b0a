//! SHA-256 hashing used for PIN verification.
//!
//! These digests gate key derivation. They are never used as keys.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::encoding::to_hex;

/// SHA-256 digest of `text`, as lowercase hex.
pub fn hash(text: &str) -> String {
    to_hex(Sha256::digest(text.as_bytes()))
}

/// Compare two hex digests without an early exit on the first mismatch.
pub fn digests_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_empty() {
        assert_eq!(
            hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digests_match() {
        let d = hash("1234");
        assert!(digests_match(&d, &hash("1234")));
        assert!(!digests_match(&d, &hash("1235")));
        assert!(!digests_match(&d, &d[..10]));
    }
}
