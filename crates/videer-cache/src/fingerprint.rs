//! Stable request fingerprints for cache addressing.

use sha2::{Digest, Sha256};
use std::fmt;

/// A cache key derived deterministically from a request's semantic
/// parameters: the same logical request always maps to the same key, and
/// distinct requests are collision-resistant (SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive a fingerprint from a canonical request string.
    pub fn of(input: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The hex digest, used as the cache file stem.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_across_calls() {
        assert_eq!(Fingerprint::of("sunset beach"), Fingerprint::of("sunset beach"));
    }

    #[test]
    fn test_distinct_inputs_differ() {
        assert_ne!(Fingerprint::of("sunset beach"), Fingerprint::of("sunset beach "));
    }

    #[test]
    fn test_hex_digest_shape() {
        let fp = Fingerprint::of("anything");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
