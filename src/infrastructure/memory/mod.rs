//! Memory Layer - In-Memory State Management
//!
//! 内存版本地存储实现

mod kv_store;

pub use kv_store::InMemoryKeyValueStore;
