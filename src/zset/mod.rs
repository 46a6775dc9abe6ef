//! Sorted-set secondary index over the append store.
//!
//! `ZAdd` writes a scored, immutable reference to an existing member key;
//! `ZScan` walks a set in score order against a snapshot, resolving every
//! reference back to the value it points at.

pub mod resolver;
pub mod scanner;
pub mod writer;

use crate::error::{Error, Result};
use crate::hasher::DIGEST_SIZE;
use crate::store::AppendStore;

/// Request to add a member to a sorted set.
#[derive(Debug, Clone)]
pub struct ZAddRequest {
    /// Member key the entry references; must already exist in the store.
    pub key: Vec<u8>,
    /// Set name, an opaque namespace over the sorted-set keyspace.
    pub set: Vec<u8>,
    pub score: f64,
    /// Pin resolution to this transaction; `None` resolves to the member
    /// key's latest value at scan time.
    pub at_tx: Option<u64>,
}

impl ZAddRequest {
    pub fn new(key: impl Into<Vec<u8>>, set: impl Into<Vec<u8>>, score: f64) -> Self {
        Self {
            key: key.into(),
            set: set.into(),
            score,
            at_tx: None,
        }
    }

    /// Pin the reference to a specific transaction.
    pub fn at_tx(mut self, tx_id: u64) -> Self {
        self.at_tx = Some(tx_id);
        self
    }
}

/// Result of a successful [`ZAddRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZAddResult {
    pub tx_id: u64,
    pub root: [u8; DIGEST_SIZE],
}

/// Request to scan a sorted set in score order.
#[derive(Debug, Clone, Default)]
pub struct ZScanRequest {
    pub set: Vec<u8>,
    /// Entries with a score below this are excluded.
    pub min: Option<f64>,
    /// Entries with a score above this are excluded.
    pub max: Option<f64>,
    /// Continuation cursor: the raw composite key of the last item from a
    /// prior scan. Takes precedence over min/max for positioning and is
    /// itself excluded from the results.
    pub offset: Option<Vec<u8>>,
    /// Maximum number of items to return; 0 means unbounded.
    pub limit: u64,
    /// Descending score order when true.
    pub reverse: bool,
}

/// One resolved sorted-set entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ZItem {
    /// Member key the entry references.
    pub key: Vec<u8>,
    /// Resolved value (latest, or as of the pinned transaction).
    pub value: Vec<u8>,
    /// Transaction that wrote the resolved value.
    pub tx_id: u64,
    pub score: f64,
    /// Raw composite key, usable as the next scan's offset cursor.
    pub cursor: Vec<u8>,
    /// Transaction that wrote the sorted-set entry itself.
    pub index: u64,
}

/// Inclusion proof for a verified sorted-set write.
#[derive(Debug, Clone)]
pub struct Proof {
    pub leaf: [u8; DIGEST_SIZE],
    pub root: [u8; DIGEST_SIZE],
    pub tx_id: u64,
}

/// Sorted-set operations bound to a store. The store is injected; no
/// state is shared across calls.
pub struct SortedSet<'s, S: AppendStore> {
    store: &'s S,
}

impl<'s, S: AppendStore> SortedSet<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Add a scored reference to `request.key` in the named set.
    pub fn zadd(&self, request: &ZAddRequest) -> Result<ZAddResult> {
        writer::zadd(self.store, request)
    }

    /// Scan the named set in score order, resolving each reference.
    pub fn zscan(&self, request: &ZScanRequest) -> Result<Vec<ZItem>> {
        scanner::zscan(self.store, request)
    }

    /// Verified variant of [`SortedSet::zadd`] returning an inclusion
    /// proof. Part of the public surface for forward compatibility; this
    /// version does not implement it.
    pub fn safe_zadd(&self, _request: &ZAddRequest) -> Result<Proof> {
        Err(Error::Unsupported("SafeZAdd"))
    }
}
