//! Sled 本地存储

mod kv_store;

pub use kv_store::{SledKeyValueStore, SledStoreConfig};
