pub mod config;
pub mod encoding;
pub mod error;
pub mod hasher;
pub mod store;
pub mod value;
pub mod zset;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use store::{AppendStore, Item, KvPair, MemStore};
pub use value::Value;
pub use zset::{SortedSet, ZAddRequest, ZAddResult, ZItem, ZScanRequest};
