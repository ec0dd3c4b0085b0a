//! Cryptographically secure randomness from the operating system.

use rand::{rngs::OsRng, RngCore};

use pinvault_common::{Error, Result};

/// Draw `len` random bytes from the OS RNG.
///
/// # Errors
/// - `EntropyUnavailable` if the platform RNG cannot be read
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    fill(&mut buf)?;
    Ok(buf)
}

/// Draw a fixed-size array of random bytes.
pub fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    fill(&mut buf)?;
    Ok(buf)
}

fn fill(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::EntropyUnavailable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length() {
        assert_eq!(random_bytes(0).unwrap().len(), 0);
        assert_eq!(random_bytes(16).unwrap().len(), 16);
    }

    #[test]
    fn test_random_bytes_differ() {
        let a = random_bytes(32).unwrap();
        let b = random_bytes(32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_array() {
        let a: [u8; 12] = random_array().unwrap();
        let b: [u8; 12] = random_array().unwrap();
        assert_ne!(a, b);
    }
}
