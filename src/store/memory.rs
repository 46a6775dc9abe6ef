//! In-memory implementation of the append-only store contract.
//!
//! Layout mirrors an LSM memtable setup: a lock-free skip list maps keys to
//! value pointers, values live in an append-only log addressed by offset,
//! and a transaction log records every commit's write set together with the
//! accumulator root chained over it. Commits are linearized by a single
//! commit lock; reads are lock-free against the skip list.

use crossbeam_skiplist::SkipMap;

use super::{
    AppendStore, CommitResult, IndexEntry, Item, KvPair, ReaderSpec, Snapshot, SnapshotReader,
    StartAt, TxScratch, ValuePointer,
};
use crate::config::StoreConfig;
use crate::encoding::prefix_end;
use crate::error::{Error, Result};
use crate::hasher::{self, Hasher, DIGEST_SIZE};

use std::collections::{btree_map, BTreeMap};
use std::ops::Bound;
use std::sync::{Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy)]
struct IndexedValue {
    pointer: ValuePointer,
    tx_id: u64,
}

#[derive(Debug)]
struct TxRecord {
    root: [u8; DIGEST_SIZE],
    entries: Vec<(Vec<u8>, ValuePointer)>,
}

/// In-memory append-only verifiable store.
pub struct MemStore {
    config: StoreConfig,

    // Live ordered index. Writers are serialized by commit_lock; reads and
    // iteration are lock-free.
    index: SkipMap<Vec<u8>, IndexedValue>,
    value_log: RwLock<Vec<u8>>,
    txs: RwLock<Vec<TxRecord>>,
    commit_lock: Mutex<()>,
}

impl MemStore {
    /// Create a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with custom configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        let value_log = RwLock::new(Vec::with_capacity(config.value_log_capacity));
        Self {
            config,
            index: SkipMap::new(),
            value_log,
            txs: RwLock::new(Vec::new()),
            commit_lock: Mutex::new(()),
        }
    }

    /// Current accumulator root: the last commit's root, or the configured
    /// seed if nothing was committed yet.
    pub fn root(&self) -> [u8; DIGEST_SIZE] {
        self.txs
            .read()
            .unwrap()
            .last()
            .map(|tx| tx.root)
            .unwrap_or(self.config.root_seed)
    }

    /// Number of committed transactions.
    pub fn tx_count(&self) -> u64 {
        self.txs.read().unwrap().len() as u64
    }

    /// Flip one byte of the value log to simulate on-disk corruption.
    #[cfg(test)]
    pub(crate) fn corrupt_value_at(&self, offset: u64) {
        let mut log = self.value_log.write().unwrap();
        log[offset as usize] ^= 0xFF;
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppendStore for MemStore {
    type Snap = MemSnapshot;

    fn commit(&self, entries: Vec<KvPair>) -> Result<CommitResult> {
        let _guard = self.commit_lock.lock().unwrap();

        // Append values to the log and build their pointers.
        let mut tx_entries = Vec::with_capacity(entries.len());
        {
            let mut log = self.value_log.write().unwrap();
            for pair in entries {
                let pointer = ValuePointer {
                    len: pair.value.len() as u32,
                    offset: log.len() as u64,
                    hash: hasher::digest(&pair.value),
                };
                log.extend_from_slice(&pair.value);
                tx_entries.push((pair.key, pointer));
            }
        }

        let mut txs = self.txs.write().unwrap();
        let tx_id = txs.len() as u64 + 1;

        // Chain the accumulator over the write-set digest.
        let mut write_set = Hasher::new();
        for (key, pointer) in &tx_entries {
            write_set.write(&(key.len() as u64).to_be_bytes());
            write_set.write(key);
            write_set.write(&pointer.hash);
        }
        let prev_root = txs.last().map(|tx| tx.root).unwrap_or(self.config.root_seed);
        let mut acc = Hasher::new();
        acc.write(&prev_root);
        acc.write(&tx_id.to_be_bytes());
        acc.write(&write_set.checksum());
        let root = acc.checksum();

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        for (key, pointer) in &tx_entries {
            self.index.insert(
                key.clone(),
                IndexedValue {
                    pointer: *pointer,
                    tx_id,
                },
            );
        }

        tracing::debug!(tx = tx_id, entries = tx_entries.len(), "committed transaction");

        txs.push(TxRecord {
            root,
            entries: tx_entries,
        });

        Ok(CommitResult {
            tx_id,
            timestamp,
            root,
        })
    }

    fn read_tx(&self, tx_id: u64, scratch: &mut TxScratch) -> Result<()> {
        let txs = self.txs.read().unwrap();
        if tx_id == 0 || tx_id > txs.len() as u64 {
            return Err(Error::TxNotFound(tx_id));
        }
        let record = &txs[(tx_id - 1) as usize];
        scratch.tx_id = tx_id;
        scratch.entries.clear();
        for (key, pointer) in &record.entries {
            scratch.entries.insert(key.clone(), *pointer);
        }
        Ok(())
    }

    fn read_value(&self, scratch: &TxScratch, key: &[u8]) -> Result<Vec<u8>> {
        let pointer = scratch.entries.get(key).ok_or(Error::KeyNotFound)?;
        let mut buf = vec![0u8; pointer.len as usize];
        self.read_value_at(&mut buf, pointer.offset, pointer.hash)?;
        Ok(buf)
    }

    fn read_current(&self, key: &[u8]) -> Result<Item> {
        let entry = self.index.get(key).ok_or(Error::KeyNotFound)?;
        let indexed = *entry.value();
        let mut buf = vec![0u8; indexed.pointer.len as usize];
        self.read_value_at(&mut buf, indexed.pointer.offset, indexed.pointer.hash)?;
        Ok(Item {
            key: key.to_vec(),
            value: buf,
            tx_id: indexed.tx_id,
        })
    }

    fn read_value_at(
        &self,
        buf: &mut [u8],
        offset: u64,
        expected: [u8; DIGEST_SIZE],
    ) -> Result<()> {
        let log = self.value_log.read().unwrap();
        let start = offset as usize;
        let end = start + buf.len();
        if end > log.len() {
            return Err(Error::Corrupted(format!(
                "value read of {} bytes at offset {} past log end {}",
                buf.len(),
                offset,
                log.len()
            )));
        }
        buf.copy_from_slice(&log[start..end]);
        if hasher::digest(buf) != expected {
            return Err(Error::HashMismatch);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<MemSnapshot> {
        // Hold the commit lock so no commit lands mid-copy; the clone is
        // the snapshot's consistent view.
        let _guard = self.commit_lock.lock().unwrap();
        let mut entries = BTreeMap::new();
        for entry in self.index.iter() {
            entries.insert(entry.key().clone(), *entry.value());
        }
        Ok(MemSnapshot { entries })
    }
}

/// Owned, consistent copy of the ordered index at snapshot time. Dropped
/// when the scan completes.
pub struct MemSnapshot {
    entries: BTreeMap<Vec<u8>, IndexedValue>,
}

impl Snapshot for MemSnapshot {
    type Reader<'a>
        = MemReader<'a>
    where
        Self: 'a;

    fn reader(&self, spec: ReaderSpec) -> Result<MemReader<'_>> {
        let prefix_hi = prefix_end(&spec.prefix);

        let (lower, upper) = if spec.ascending {
            let lower = match &spec.start {
                Some(StartAt::Inclusive(key)) => Bound::Included(key.clone()),
                Some(StartAt::Exclusive(key)) => Bound::Excluded(key.clone()),
                None => Bound::Included(spec.prefix.clone()),
            };
            let upper = match prefix_hi {
                Some(end) => Bound::Excluded(end),
                None => Bound::Unbounded,
            };
            (lower, upper)
        } else {
            // Descending: the start position becomes the upper bound. An
            // inclusive start must also cover keys it is a prefix of.
            let upper = match &spec.start {
                Some(StartAt::Inclusive(key)) => match prefix_end(key) {
                    Some(end) => Bound::Excluded(end),
                    None => Bound::Unbounded,
                },
                Some(StartAt::Exclusive(key)) => Bound::Excluded(key.clone()),
                None => match prefix_hi {
                    Some(end) => Bound::Excluded(end),
                    None => Bound::Unbounded,
                },
            };
            (Bound::Included(spec.prefix.clone()), upper)
        };

        Ok(MemReader {
            range: self.entries.range((lower, upper)),
            prefix: spec.prefix,
            ascending: spec.ascending,
        })
    }
}

/// Direction-aware range reader over a snapshot.
pub struct MemReader<'a> {
    range: btree_map::Range<'a, Vec<u8>, IndexedValue>,
    prefix: Vec<u8>,
    ascending: bool,
}

impl SnapshotReader for MemReader<'_> {
    fn read(&mut self) -> Result<Option<IndexEntry>> {
        loop {
            let next = if self.ascending {
                self.range.next()
            } else {
                self.range.next_back()
            };
            let Some((key, indexed)) = next else {
                return Ok(None);
            };
            // Range bounds already confine us to the prefix except when a
            // caller-supplied start sits outside it; filter those out.
            if !key.starts_with(&self.prefix) {
                continue;
            }
            return Ok(Some(IndexEntry {
                key: key.clone(),
                pointer: indexed.pointer.encode(),
                index: indexed.tx_id,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &[u8], value: &[u8]) -> KvPair {
        KvPair {
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    fn commit_one(store: &MemStore, key: &[u8], value: &[u8]) -> CommitResult {
        store.commit(vec![pair(key, value)]).expect("commit failed")
    }

    #[test]
    fn test_commit_monotonic_ids_and_roots() {
        let store = MemStore::new();
        let seed = store.root();

        let first = commit_one(&store, b"k1", b"v1");
        let second = commit_one(&store, b"k2", b"v2");

        assert_eq!(first.tx_id, 1);
        assert_eq!(second.tx_id, 2);
        assert_ne!(first.root, seed);
        assert_ne!(second.root, first.root);
        assert_eq!(store.root(), second.root);
        assert_eq!(store.tx_count(), 2);
    }

    #[test]
    fn test_read_current() {
        let store = MemStore::new();
        commit_one(&store, b"k1", b"v1");
        let tx = commit_one(&store, b"k1", b"v2");

        let item = store.read_current(b"k1").expect("read_current failed");
        assert_eq!(item.key, b"k1");
        assert_eq!(item.value, b"v2");
        assert_eq!(item.tx_id, tx.tx_id);

        assert_eq!(store.read_current(b"missing"), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_read_tx_and_value() {
        let store = MemStore::new();
        let first = commit_one(&store, b"k1", b"old");
        commit_one(&store, b"k1", b"new");

        let mut scratch = TxScratch::new();
        store
            .read_tx(first.tx_id, &mut scratch)
            .expect("read_tx failed");
        assert_eq!(scratch.tx_id(), first.tx_id);
        assert_eq!(store.read_value(&scratch, b"k1").unwrap(), b"old");
        assert_eq!(store.read_value(&scratch, b"k2"), Err(Error::KeyNotFound));

        assert_eq!(store.read_tx(0, &mut scratch), Err(Error::TxNotFound(0)));
        assert_eq!(store.read_tx(99, &mut scratch), Err(Error::TxNotFound(99)));
    }

    #[test]
    fn test_read_value_at_detects_corruption() {
        let store = MemStore::new();
        commit_one(&store, b"k1", b"payload");

        let item = store.read_current(b"k1").unwrap();
        assert_eq!(item.value, b"payload");

        store.corrupt_value_at(0);
        assert_eq!(store.read_current(b"k1"), Err(Error::HashMismatch));
    }

    #[test]
    fn test_read_value_at_out_of_bounds() {
        let store = MemStore::new();
        let mut buf = [0u8; 16];
        assert!(store.read_value_at(&mut buf, 0, [0u8; DIGEST_SIZE]).is_err());
    }

    #[test]
    fn test_snapshot_isolation() {
        let store = MemStore::new();
        commit_one(&store, b"p/a", b"1");

        let snapshot = store.snapshot().unwrap();
        commit_one(&store, b"p/b", b"2");

        let mut reader = snapshot
            .reader(ReaderSpec {
                prefix: b"p/".to_vec(),
                start: None,
                ascending: true,
            })
            .unwrap();

        let entry = reader.read().unwrap().expect("expected one entry");
        assert_eq!(entry.key, b"p/a");
        assert!(reader.read().unwrap().is_none(), "commit after snapshot leaked in");
    }

    #[test]
    fn test_reader_prefix_and_direction() {
        let store = MemStore::new();
        commit_one(&store, b"p/a", b"1");
        commit_one(&store, b"p/b", b"2");
        commit_one(&store, b"p/c", b"3");
        commit_one(&store, b"q/d", b"4");

        let snapshot = store.snapshot().unwrap();

        let keys = |ascending: bool, start: Option<StartAt>| -> Vec<Vec<u8>> {
            let mut reader = snapshot
                .reader(ReaderSpec {
                    prefix: b"p/".to_vec(),
                    start,
                    ascending,
                })
                .unwrap();
            let mut out = Vec::new();
            while let Some(entry) = reader.read().unwrap() {
                out.push(entry.key);
            }
            out
        };

        assert_eq!(keys(true, None), vec![b"p/a".to_vec(), b"p/b".to_vec(), b"p/c".to_vec()]);
        assert_eq!(keys(false, None), vec![b"p/c".to_vec(), b"p/b".to_vec(), b"p/a".to_vec()]);

        // Exclusive start skips the cursor key itself, both directions.
        assert_eq!(
            keys(true, Some(StartAt::Exclusive(b"p/a".to_vec()))),
            vec![b"p/b".to_vec(), b"p/c".to_vec()]
        );
        assert_eq!(
            keys(false, Some(StartAt::Exclusive(b"p/c".to_vec()))),
            vec![b"p/b".to_vec(), b"p/a".to_vec()]
        );

        // Inclusive start keeps keys it is a prefix of.
        assert_eq!(
            keys(true, Some(StartAt::Inclusive(b"p/b".to_vec()))),
            vec![b"p/b".to_vec(), b"p/c".to_vec()]
        );
        assert_eq!(
            keys(false, Some(StartAt::Inclusive(b"p/b".to_vec()))),
            vec![b"p/b".to_vec(), b"p/a".to_vec()]
        );
    }

    #[test]
    fn test_pointer_round_trip_through_reader() {
        let store = MemStore::new();
        let result = commit_one(&store, b"p/a", b"value-bytes");

        let snapshot = store.snapshot().unwrap();
        let mut reader = snapshot
            .reader(ReaderSpec {
                prefix: b"p/".to_vec(),
                start: None,
                ascending: true,
            })
            .unwrap();

        let entry = reader.read().unwrap().expect("expected entry");
        assert_eq!(entry.index, result.tx_id);

        let pointer = ValuePointer::decode(&entry.pointer).unwrap();
        let mut buf = vec![0u8; pointer.len as usize];
        store
            .read_value_at(&mut buf, pointer.offset, pointer.hash)
            .unwrap();
        assert_eq!(buf, b"value-bytes");
    }
}
