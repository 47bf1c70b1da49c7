//! Signature hashing
//!
//! Leak groups are keyed by a stable SHA-256 hex digest so that the same
//! retention shape yields the same key across runs and dumps.

use sha2::{Digest, Sha256};

/// Hash a string to a lowercase SHA-256 hex digest (64 chars)
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_hex_is_stable() {
        assert_eq!(sha256_hex("leak"), sha256_hex("leak"));
        assert_ne!(sha256_hex("leak"), sha256_hex("leak2"));
        assert_eq!(sha256_hex("").len(), 64);
    }
}
