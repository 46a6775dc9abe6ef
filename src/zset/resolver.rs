//! Resolves a decoded reference to the item it points at.

use crate::encoding::Reference;
use crate::error::Result;
use crate::store::{AppendStore, Item, TxScratch};

/// Resolve a reference. Pinned references replay the pinned transaction and
/// read the member key's value there; unpinned references read the member
/// key's current value. Both fail if the target is absent at that point.
pub fn resolve<S: AppendStore>(store: &S, reference: &Reference) -> Result<Item> {
    match reference.pin {
        Some(tx_id) => {
            let mut scratch = TxScratch::new();
            store.read_tx(tx_id, &mut scratch)?;
            let value = store.read_value(&scratch, &reference.key)?;
            Ok(Item {
                key: reference.key.clone(),
                value,
                tx_id,
            })
        }
        None => store.read_current(&reference.key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{AppendStore as _, KvPair, MemStore};

    fn put(store: &MemStore, key: &[u8], value: &[u8]) -> u64 {
        store
            .commit(vec![KvPair {
                key: key.to_vec(),
                value: value.to_vec(),
            }])
            .expect("commit failed")
            .tx_id
    }

    #[test]
    fn test_resolve_unpinned_reads_latest() {
        let store = MemStore::new();
        put(&store, b"k1", b"old");
        let tx = put(&store, b"k1", b"new");

        let item = resolve(&store, &Reference::new(b"k1".to_vec(), None)).unwrap();
        assert_eq!(item.value, b"new");
        assert_eq!(item.tx_id, tx);
    }

    #[test]
    fn test_resolve_pinned_reads_historical() {
        let store = MemStore::new();
        let old_tx = put(&store, b"k1", b"old");
        put(&store, b"k1", b"new");

        let item = resolve(&store, &Reference::new(b"k1".to_vec(), Some(old_tx))).unwrap();
        assert_eq!(item.value, b"old");
        assert_eq!(item.tx_id, old_tx);
    }

    #[test]
    fn test_resolve_absent_target_fails() {
        let store = MemStore::new();
        let tx = put(&store, b"k1", b"v1");

        assert_eq!(
            resolve(&store, &Reference::new(b"missing".to_vec(), None)),
            Err(Error::KeyNotFound)
        );
        assert_eq!(
            resolve(&store, &Reference::new(b"missing".to_vec(), Some(tx))),
            Err(Error::KeyNotFound)
        );
        assert_eq!(
            resolve(&store, &Reference::new(b"k1".to_vec(), Some(tx + 1))),
            Err(Error::TxNotFound(tx + 1))
        );
    }
}
