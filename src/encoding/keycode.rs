//! Order-preserving score encoding and the composite sorted-set key layout.
//!
//! A sorted-set entry is keyed as
//!
//! ```text
//! SET_SEPARATOR ++ set ++ encode_score(score) ++ member ++ [be64(pin)]
//! ```
//!
//! so byte-lexicographic order over composite keys equals `(set, score)`
//! order. Entries sharing a score tie-break by member key bytes, then by
//! pin bytes. Plain keys must not begin with the separator byte; it is
//! reserved to partition sorted-set entries from the rest of the keyspace.

use crate::error::{Error, Result};

/// Reserved first byte of every sorted-set composite key.
pub const SET_SEPARATOR: u8 = 0x00;

/// Width of an encoded score in bytes.
pub const SCORE_SIZE: usize = 8;

/// Encode a score with order preservation.
///
/// Reinterprets the IEEE 754 bit pattern as an unsigned integer, then:
/// - negative: flip all bits
/// - non-negative: flip only the sign bit
///
/// The resulting big-endian bytes compare lexicographically in numeric
/// order, across the sign boundary and for both infinities.
pub fn encode_score(score: f64) -> [u8; SCORE_SIZE] {
    let bits = score.to_bits();
    let ordered_bits = if bits & (1u64 << 63) != 0 {
        !bits
    } else {
        bits | (1u64 << 63)
    };
    ordered_bits.to_be_bytes()
}

/// Decode a score. Exact inverse of [`encode_score`]; total for all inputs.
pub fn decode_score(bytes: [u8; SCORE_SIZE]) -> f64 {
    let ordered_bits = u64::from_be_bytes(bytes);
    let bits = if ordered_bits & (1u64 << 63) != 0 {
        ordered_bits & !(1u64 << 63)
    } else {
        !ordered_bits
    };
    f64::from_bits(bits)
}

/// Prefix covering every entry of a set: `SET_SEPARATOR ++ set`.
pub fn set_prefix(set: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + set.len());
    key.push(SET_SEPARATOR);
    key.extend_from_slice(set);
    key
}

/// Prefix covering every entry of a set with the given score. Used to
/// position scans at a score bound.
pub fn set_score_prefix(set: &[u8], score: f64) -> Vec<u8> {
    let mut key = set_prefix(set);
    key.extend_from_slice(&encode_score(score));
    key
}

/// Build the composite key for a sorted-set entry.
pub fn build_set_key(member: &[u8], set: &[u8], score: f64, pin: Option<u64>) -> Vec<u8> {
    let mut key = set_score_prefix(set, score);
    key.extend_from_slice(member);
    if let Some(tx) = pin {
        key.extend_from_slice(&tx.to_be_bytes());
    }
    key
}

/// Extract the score from a composite key belonging to `set`.
///
/// Fails if the key does not start with `SET_SEPARATOR ++ set` or is too
/// short to carry a score field.
pub fn score_of(key: &[u8], set: &[u8]) -> Result<f64> {
    let prefix = set_prefix(set);
    if !key.starts_with(&prefix) {
        return Err(Error::Corrupted(
            "composite key does not belong to set".to_string(),
        ));
    }
    let rest = &key[prefix.len()..];
    if rest.len() < SCORE_SIZE {
        return Err(Error::Corrupted(
            "composite key truncated before score field".to_string(),
        ));
    }
    let mut buf = [0u8; SCORE_SIZE];
    buf.copy_from_slice(&rest[..SCORE_SIZE]);
    Ok(decode_score(buf))
}

/// Whether a key carries the sorted-set separator. Keys without it are not
/// sorted-set entries and must not be interpreted as such.
pub fn has_separator(key: &[u8]) -> bool {
    key.first() == Some(&SET_SEPARATOR)
}

/// Smallest key strictly greater than every key having `prefix` as a
/// prefix, or `None` if no such key exists (all bytes 0xFF).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_ordering() {
        let values = [
            f64::NEG_INFINITY,
            -100.5,
            -1.5,
            -1.0,
            -0.0,
            0.0,
            1.0,
            2.25,
            100.5,
            f64::INFINITY,
        ];
        let encoded: Vec<_> = values.iter().map(|v| encode_score(*v)).collect();

        for i in 1..encoded.len() {
            assert!(
                encoded[i - 1] <= encoded[i],
                "encode({}) should not sort after encode({})",
                values[i - 1],
                values[i]
            );
        }

        // Strict across the sign boundary
        assert!(encode_score(-1.5) < encode_score(0.0));
        assert!(encode_score(0.0) < encode_score(2.25));
        assert_eq!(encode_score(3.5), encode_score(3.5));
    }

    #[test]
    fn test_score_round_trip() {
        let values = [
            f64::NEG_INFINITY,
            f64::MIN,
            -100.5,
            -0.0,
            0.0,
            f64::MIN_POSITIVE,
            std::f64::consts::PI,
            f64::MAX,
            f64::INFINITY,
        ];
        for v in values {
            let decoded = decode_score(encode_score(v));
            assert_eq!(v.to_bits(), decoded.to_bits(), "round trip of {}", v);
        }
        assert!(decode_score(encode_score(-0.0)).is_sign_negative());
    }

    #[test]
    fn test_composite_key_layout() {
        let key = build_set_key(b"member", b"myset", 1.5, None);
        assert_eq!(key[0], SET_SEPARATOR);
        assert!(key.starts_with(&set_prefix(b"myset")));
        assert!(key.starts_with(&set_score_prefix(b"myset", 1.5)));
        assert!(key.ends_with(b"member"));

        let pinned = build_set_key(b"member", b"myset", 1.5, Some(42));
        assert_eq!(pinned.len(), key.len() + 8);
        assert!(pinned.ends_with(&42u64.to_be_bytes()));
    }

    #[test]
    fn test_composite_keys_sort_by_score() {
        let low = build_set_key(b"zzz", b"set", -3.0, None);
        let mid = build_set_key(b"mmm", b"set", 0.5, None);
        let high = build_set_key(b"aaa", b"set", 7.0, None);
        assert!(low < mid);
        assert!(mid < high);

        // Equal scores tie-break by member key bytes
        let a = build_set_key(b"aaa", b"set", 1.0, None);
        let b = build_set_key(b"bbb", b"set", 1.0, None);
        assert!(a < b);
    }

    #[test]
    fn test_score_of_round_trip() {
        for score in [-2.5, -0.0, 0.0, 1.0, f64::INFINITY] {
            for pin in [None, Some(9u64)] {
                let key = build_set_key(b"k1", b"scores", score, pin);
                let got = score_of(&key, b"scores").expect("score_of failed");
                assert_eq!(score.to_bits(), got.to_bits());
            }
        }
    }

    #[test]
    fn test_score_of_wrong_set() {
        let key = build_set_key(b"k1", b"scores", 1.0, None);
        assert!(score_of(&key, b"other").is_err());
        assert!(score_of(b"plainkey", b"scores").is_err());
        assert!(score_of(&set_prefix(b"scores"), b"scores").is_err());
    }

    #[test]
    fn test_has_separator() {
        assert!(has_separator(&build_set_key(b"k", b"s", 0.0, None)));
        assert!(!has_separator(b"plainkey"));
        assert!(!has_separator(b""));
    }

    #[test]
    fn test_prefix_end() {
        assert_eq!(prefix_end(b"abc"), Some(b"abd".to_vec()));
        assert_eq!(prefix_end(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_end(&[0xFF, 0xFF]), None);

        let prefix = set_prefix(b"myset");
        let end = prefix_end(&prefix).unwrap();
        let key = build_set_key(b"member", b"myset", f64::INFINITY, Some(u64::MAX));
        assert!(prefix.as_slice() < key.as_slice());
        assert!(key.as_slice() < end.as_slice());
    }
}
