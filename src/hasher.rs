use std::fmt;

use sha2::{Digest, Sha256};

/// Size in bytes of a content digest.
pub const DIGEST_SIZE: usize = 32;

/// Incremental SHA-256 hasher used for value content digests and the
/// commit accumulator chain.
#[derive(Clone)]
pub struct Hasher {
    inner: Sha256,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hasher")
    }
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn write(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Digest of everything written so far. Does not consume the hasher.
    pub fn checksum(&self) -> [u8; DIGEST_SIZE] {
        self.inner.clone().finalize().into()
    }

    pub fn reset(&mut self) {
        self.inner = Sha256::new();
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot digest of a byte slice.
pub fn digest(data: &[u8]) -> [u8; DIGEST_SIZE] {
    Sha256::digest(data).into()
}
