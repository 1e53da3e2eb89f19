use std::fmt;

/// A blake3 digest. Secrets are compared through their digests so the
/// comparison time does not depend on where the raw values first differ.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct CryptoHash {
    hash: [u8; 32],
}

impl CryptoHash {
    pub fn new(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }
}

impl fmt::Debug for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CryptoHash(..)")
    }
}

pub fn blake3_hash(bytes: &[u8]) -> CryptoHash {
    CryptoHash::new(*blake3::hash(bytes).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_equality() {
        assert_eq!(blake3_hash(b"abc"), blake3_hash(b"abc"));
        assert_ne!(blake3_hash(b"abc"), blake3_hash(b"abd"));
        assert_ne!(blake3_hash(b"abc"), CryptoHash::default());
    }

    #[test]
    fn test_debug_does_not_leak() {
        assert_eq!(format!("{:?}", blake3_hash(b"secret")), "CryptoHash(..)");
    }
}
