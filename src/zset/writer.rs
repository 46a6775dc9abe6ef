//! Sorted-set write path.

use super::{ZAddRequest, ZAddResult};
use crate::encoding::{build_set_key, Reference};
use crate::error::{Error, Result};
use crate::store::{AppendStore, KvPair, TxScratch};

/// Validate the reference target, then commit one composite-key/reference
/// pair as a single transaction. Entries are immutable; re-scoring a member
/// adds a new entry and never touches the old one.
pub fn zadd<S: AppendStore>(store: &S, request: &ZAddRequest) -> Result<ZAddResult> {
    let (key, payload) = build_entry(store, request)?;

    let result = store.commit(vec![KvPair {
        key,
        value: payload,
    }])?;

    tracing::debug!(tx = result.tx_id, "sorted-set entry committed");

    Ok(ZAddResult {
        tx_id: result.tx_id,
        root: result.root,
    })
}

/// Build the composite key and reference payload for a ZAdd.
///
/// Pinned requests require the member key in the pinned transaction's write
/// set; unpinned requests require it to currently exist under exactly the
/// requested key. Either failure is a reference mismatch, a caller error.
fn build_entry<S: AppendStore>(store: &S, request: &ZAddRequest) -> Result<(Vec<u8>, Vec<u8>)> {
    let pin = match request.at_tx {
        Some(tx_id) => {
            let mut scratch = TxScratch::new();
            store.read_tx(tx_id, &mut scratch)?;
            store
                .read_value(&scratch, &request.key)
                .map_err(|err| match err {
                    Error::KeyNotFound => Error::ReferenceMismatch,
                    other => other,
                })?;
            Some(tx_id)
        }
        None => {
            let item = store.read_current(&request.key).map_err(|err| match err {
                Error::KeyNotFound => Error::ReferenceMismatch,
                other => other,
            })?;
            if item.key != request.key {
                return Err(Error::ReferenceMismatch);
            }
            // No pin is stored for latest-value references, so a client
            // can reproduce the exact payload bytes without knowing
            // server-side index state.
            None
        }
    };

    let key = build_set_key(&request.key, &request.set, request.score, pin);
    let payload = Reference::new(request.key.clone(), pin).encode();
    Ok((key, payload))
}
