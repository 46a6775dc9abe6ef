//! Contract the sorted-set layer requires from the underlying append-only,
//! verifiable key/value store, plus the types that cross it.

pub mod memory;

pub use memory::MemStore;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::hasher::DIGEST_SIZE;

use std::collections::BTreeMap;

/// A key/value pair submitted to [`AppendStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    /// Strictly increasing global transaction id.
    pub tx_id: u64,
    /// Commit wall-clock time, seconds since the Unix epoch.
    pub timestamp: u64,
    /// Accumulator root after this commit, usable for external auditing.
    pub root: [u8; DIGEST_SIZE],
}

/// A resolved key/value item and the transaction that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub tx_id: u64,
}

/// Locates a value in the store's value log: length, byte offset, and the
/// content digest verified on every random-access read.
///
/// Encoded as `be32(len) ++ be64(offset) ++ digest`, 44 bytes. This encoded
/// form is what ordered-index readers hand back as the entry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuePointer {
    pub len: u32,
    pub offset: u64,
    pub hash: [u8; DIGEST_SIZE],
}

/// Encoded size of a [`ValuePointer`].
pub const VALUE_POINTER_SIZE: usize = 4 + 8 + DIGEST_SIZE;

impl ValuePointer {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(VALUE_POINTER_SIZE);
        buf.extend_from_slice(&self.len.to_be_bytes());
        buf.extend_from_slice(&self.offset.to_be_bytes());
        buf.extend_from_slice(&self.hash);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != VALUE_POINTER_SIZE {
            return Err(Error::Corrupted(format!(
                "value pointer must be {} bytes, got {}",
                VALUE_POINTER_SIZE,
                bytes.len()
            )));
        }
        let mut hash = [0u8; DIGEST_SIZE];
        hash.copy_from_slice(&bytes[12..]);
        Ok(Self {
            len: BigEndian::read_u32(&bytes[..4]),
            offset: BigEndian::read_u64(&bytes[4..12]),
            hash,
        })
    }
}

/// Per-call scratch holding one historical transaction's write set.
///
/// Created fresh by each caller that replays a transaction; never shared
/// across calls, so concurrent reads stay safe.
#[derive(Debug, Default)]
pub struct TxScratch {
    pub(crate) tx_id: u64,
    pub(crate) entries: BTreeMap<Vec<u8>, ValuePointer>,
}

impl TxScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the transaction currently loaded, 0 if none.
    pub fn tx_id(&self) -> u64 {
        self.tx_id
    }
}

/// One entry yielded by an ordered-index reader: the raw key, the encoded
/// [`ValuePointer`] payload, and the transaction that wrote the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: Vec<u8>,
    pub pointer: Vec<u8>,
    pub index: u64,
}

/// Where an ordered-index reader positions itself within a prefix range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartAt {
    /// Begin at the first key having (or following) this key, including
    /// every key it is a prefix of.
    Inclusive(Vec<u8>),
    /// Begin strictly past this exact key. Used for cursor continuation.
    Exclusive(Vec<u8>),
}

/// Configuration for an ordered-index reader over a snapshot.
#[derive(Debug, Clone)]
pub struct ReaderSpec {
    /// Only keys carrying this prefix are yielded.
    pub prefix: Vec<u8>,
    /// Start position within the prefix range; `None` starts at the
    /// prefix boundary for the requested direction.
    pub start: Option<StartAt>,
    /// Ascending key order when true, descending otherwise.
    pub ascending: bool,
}

/// A consistent point-in-time view of the ordered index, isolated from
/// commits that happen after it is taken. Released on drop.
pub trait Snapshot {
    type Reader<'a>: SnapshotReader
    where
        Self: 'a;

    fn reader(&self, spec: ReaderSpec) -> Result<Self::Reader<'_>>;
}

/// Forward-only reader over a snapshot. `Ok(None)` signals end of
/// sequence; it is a normal termination, not an error.
pub trait SnapshotReader {
    fn read(&mut self) -> Result<Option<IndexEntry>>;
}

/// Append-only, verifiable key/value store the sorted-set layer builds on.
///
/// Commits are atomic, durable, and linearized, each yielding a strictly
/// increasing transaction id and a fresh accumulator root.
pub trait AppendStore {
    type Snap: Snapshot;

    /// Atomically commit a write set.
    fn commit(&self, entries: Vec<KvPair>) -> Result<CommitResult>;

    /// Load a historical transaction's write set into `scratch`.
    fn read_tx(&self, tx_id: u64, scratch: &mut TxScratch) -> Result<()>;

    /// Read the value a loaded transaction wrote for `key`. Fails with
    /// [`Error::KeyNotFound`] if the key is absent from that write set.
    fn read_value(&self, scratch: &TxScratch, key: &[u8]) -> Result<Vec<u8>>;

    /// Read the current value of `key`. Fails with [`Error::KeyNotFound`]
    /// if the key was never written.
    fn read_current(&self, key: &[u8]) -> Result<Item>;

    /// Random-access read of `buf.len()` bytes at `offset` in the value
    /// log, verified against `expected`. A digest mismatch is
    /// [`Error::HashMismatch`], a data-integrity failure.
    fn read_value_at(&self, buf: &mut [u8], offset: u64, expected: [u8; DIGEST_SIZE])
        -> Result<()>;

    /// Take a consistent snapshot for scanning.
    fn snapshot(&self) -> Result<Self::Snap>;
}
