//! Lowercase hex encoding for salts, IVs, digests and ciphertext.

use pinvault_common::{Error, Result};

/// Encode bytes as lowercase hex.
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Decode a hex string.
///
/// # Errors
/// - `Crypto` if the string has odd length or non-hex characters
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| Error::Crypto(format!("Invalid hex: {}", e)))
}

/// Decode a hex string into a fixed-size array.
pub fn from_hex_array<const N: usize>(text: &str) -> Result<[u8; N]> {
    let bytes = from_hex(text)?;
    bytes.as_slice().try_into().map_err(|_| {
        Error::Crypto(format!(
            "Invalid length: expected {} bytes, got {}",
            N,
            bytes.len()
        ))
    })
}
