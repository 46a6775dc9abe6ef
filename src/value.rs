//! Closed typed-value contract for structured values stored through the
//! append store and resolved through the sorted-set index.
//!
//! Equality is defined only for same-variant pairs. Null equals null and
//! compares unequal to everything else without error; any other
//! cross-variant pair is not comparable.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_NUM: u8 = 0x02;
const TAG_STR: u8 = 0x03;
const TAG_BLOB: u8 = 0x04;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(i64),
    Str(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Same-variant equality; see the module doc for the null and
    /// cross-variant rules.
    pub fn equal(&self, other: &Value) -> Result<bool> {
        match (self, other) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Num(a), Value::Num(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Blob(a), Value::Blob(b)) => Ok(a == b),
            _ => Err(Error::NotComparable),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Tag-byte binary encoding, so typed values can be stored as plain
    /// store values.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Value::Null => vec![TAG_NULL],
            Value::Bool(b) => vec![TAG_BOOL, u8::from(*b)],
            Value::Num(n) => {
                let mut buf = vec![TAG_NUM];
                buf.extend_from_slice(&n.to_be_bytes());
                buf
            }
            Value::Str(s) => {
                let mut buf = vec![TAG_STR];
                buf.extend_from_slice(s.as_bytes());
                buf
            }
            Value::Blob(b) => {
                let mut buf = vec![TAG_BLOB];
                buf.extend_from_slice(b);
                buf
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (tag, rest) = bytes
            .split_first()
            .ok_or_else(|| Error::Corrupted("empty typed value".to_string()))?;
        match *tag {
            TAG_NULL if rest.is_empty() => Ok(Value::Null),
            TAG_BOOL => match rest {
                [0x00] => Ok(Value::Bool(false)),
                [0x01] => Ok(Value::Bool(true)),
                _ => Err(Error::Corrupted("invalid boolean value".to_string())),
            },
            TAG_NUM if rest.len() == 8 => Ok(Value::Num(BigEndian::read_i64(rest))),
            TAG_STR => {
                let s = std::str::from_utf8(rest)
                    .map_err(|_| Error::Corrupted("typed string is not UTF-8".to_string()))?;
                Ok(Value::Str(s.to_string()))
            }
            TAG_BLOB => Ok(Value::Blob(rest.to_vec())),
            other => Err(Error::Corrupted(format!(
                "invalid typed value tag {:#04x}",
                other
            ))),
        }
    }
}
