//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod events;
pub mod http;
pub mod memory;
pub mod persistence;
pub mod stream;

pub use events::EventPublisher;
pub use http::{ApiClient, ApiClientConfig};
pub use memory::InMemoryKeyValueStore;
pub use persistence::{SledKeyValueStore, SledStoreConfig};
