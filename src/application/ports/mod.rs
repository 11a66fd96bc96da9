//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod event_sink;
mod local_store;
mod proposal_api;

pub use event_sink::{ClientEvent, EventSinkPort, NoopEventSink};
pub use local_store::{KeyValueStorePort, StoreError};
pub use proposal_api::{
    ApiError, ChangeType, ChapterGenerationRequest, ChapterStream, ContentGenerationPort,
    StreamEvent, VersionHistoryPort, VersionRecord,
};
