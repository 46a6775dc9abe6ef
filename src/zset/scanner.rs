//! Sorted-set range-scan read path.

use super::{resolver, ZItem, ZScanRequest};
use crate::encoding::format::Raw;
use crate::encoding::{has_separator, score_of, set_prefix, set_score_prefix, Reference};
use crate::error::Result;
use crate::store::{AppendStore, ReaderSpec, Snapshot, SnapshotReader, StartAt, ValuePointer};

/// Scan a sorted set in score order against a snapshot of the store.
///
/// Start-position precedence: a caller-supplied cursor always wins and is
/// excluded from the results; otherwise the score bound on the scan's
/// leading side (`min` ascending, `max` descending); otherwise the set
/// prefix. The snapshot and reader are dropped on every exit path.
pub fn zscan<S: AppendStore>(store: &S, request: &ZScanRequest) -> Result<Vec<ZItem>> {
    let start = if let Some(cursor) = &request.offset {
        Some(StartAt::Exclusive(cursor.clone()))
    } else if !request.reverse {
        request
            .min
            .map(|min| StartAt::Inclusive(set_score_prefix(&request.set, min)))
    } else {
        request
            .max
            .map(|max| StartAt::Inclusive(set_score_prefix(&request.set, max)))
    };

    let snapshot = store.snapshot()?;
    let mut reader = snapshot.reader(ReaderSpec {
        prefix: set_prefix(&request.set),
        start,
        ascending: !request.reverse,
    })?;

    let limit = if request.limit == 0 {
        u64::MAX
    } else {
        request.limit
    };
    let mut items = Vec::new();

    while let Some(entry) = reader.read()? {
        // A key without the sorted-set separator is not a sorted-set
        // entry. Skip it outright; the score filter below must never run
        // against an entry that was not resolved.
        if !has_separator(&entry.key) {
            tracing::debug!(key = %Raw::bytes(&entry.key), "skipping non sorted-set key");
            continue;
        }

        let pointer = ValuePointer::decode(&entry.pointer)?;
        let mut payload = vec![0u8; pointer.len as usize];
        store.read_value_at(&mut payload, pointer.offset, pointer.hash)?;

        let reference = Reference::decode(&payload)?;
        let item = resolver::resolve(store, &reference)?;
        let score = score_of(&entry.key, &request.set)?;

        // The start position only bounds one side of the range; both
        // bounds are re-checked per entry.
        if request.min.map_or(false, |min| score < min) {
            continue;
        }
        if request.max.map_or(false, |max| score > max) {
            continue;
        }

        items.push(ZItem {
            key: item.key,
            value: item.value,
            tx_id: item.tx_id,
            score,
            cursor: entry.key,
            index: entry.index,
        });
        if items.len() as u64 == limit {
            break;
        }
    }

    Ok(items)
}
