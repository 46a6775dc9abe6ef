//! Reference payload stored under a composite sorted-set key.
//!
//! Layout: `be64(len(member)) ++ member ++ flag ++ [be64(pin)]` where the
//! flag byte is 0x00 for an unpinned reference and 0x01 for a pinned one.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

const FLAG_UNPINNED: u8 = 0x00;
const FLAG_PINNED: u8 = 0x01;

/// A decoded sorted-set reference: the member key it points at, and
/// optionally the transaction the resolution is pinned to.
///
/// Unpinned references resolve to the member key's current value at scan
/// time; pinned references resolve to the value as of the pinned
/// transaction, forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub key: Vec<u8>,
    pub pin: Option<u64>,
}

impl Reference {
    pub fn new(key: impl Into<Vec<u8>>, pin: Option<u64>) -> Self {
        Self {
            key: key.into(),
            pin,
        }
    }

    /// Serialize the reference payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.key.len() + 9);
        buf.extend_from_slice(&(self.key.len() as u64).to_be_bytes());
        buf.extend_from_slice(&self.key);
        match self.pin {
            Some(tx) => {
                buf.push(FLAG_PINNED);
                buf.extend_from_slice(&tx.to_be_bytes());
            }
            None => buf.push(FLAG_UNPINNED),
        }
        buf
    }

    /// Parse a reference payload.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(Error::Corrupted(
                "reference payload shorter than key length field".to_string(),
            ));
        }
        let key_len = BigEndian::read_u64(&bytes[..8]) as usize;
        let flag_pos = 8 + key_len;
        if bytes.len() <= flag_pos {
            return Err(Error::Corrupted(
                "reference payload truncated before flag byte".to_string(),
            ));
        }
        let key = bytes[8..flag_pos].to_vec();
        let pin = match bytes[flag_pos] {
            FLAG_UNPINNED => None,
            FLAG_PINNED => {
                let tx_end = flag_pos + 1 + 8;
                if bytes.len() < tx_end {
                    return Err(Error::Corrupted(
                        "pinned reference truncated before transaction id".to_string(),
                    ));
                }
                Some(BigEndian::read_u64(&bytes[flag_pos + 1..tx_end]))
            }
            other => {
                return Err(Error::Corrupted(format!(
                    "invalid reference flag byte {:#04x}",
                    other
                )))
            }
        };
        Ok(Self { key, pin })
    }
}
