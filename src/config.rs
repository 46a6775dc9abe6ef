use crate::hasher::DIGEST_SIZE;

/// Configuration for the in-memory append-only store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Initial capacity reserved for the value log in bytes (default: 64KB)
    pub value_log_capacity: usize,

    /// Seed digest for the accumulator chain; the root after transaction n
    /// is `sha256(root_{n-1} ++ be64(n) ++ write-set digest)` with
    /// `root_0 = root_seed` (default: all zeroes)
    pub root_seed: [u8; DIGEST_SIZE],
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            value_log_capacity: 64 * 1024, // 64KB
            root_seed: [0u8; DIGEST_SIZE],
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set initial value log capacity
    pub fn value_log_capacity(mut self, capacity: usize) -> Self {
        self.value_log_capacity = capacity;
        self
    }

    /// Set the accumulator seed
    pub fn root_seed(mut self, seed: [u8; DIGEST_SIZE]) -> Self {
        self.root_seed = seed;
        self
    }
}
