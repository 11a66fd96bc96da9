//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（后端 API、本地存储、事件推送）
//! - session: 认证会话
//! - draft_cache: 章节草稿本地缓存
//! - commands: CQRS 命令及处理器（章节生成、目录变更）
//! - queries: CQRS 查询及处理器（版本对比）
//! - validation: 请求前的输入校验
//! - error: 应用层错误定义

pub mod commands;
pub mod draft_cache;
pub mod error;
pub mod ports;
pub mod queries;
pub mod session;
pub mod validation;

pub use commands::{
    handlers::{ApplyOutlineHandler, GenerateChapterContentsHandler, DEFAULT_MAX_CONCURRENT},
    ApplyOutlineCommand, ApplyOutlineResponse, GenerateChapterContentsCommand,
    GenerateChapterContentsResponse,
};
pub use draft_cache::{DraftCache, DraftEntries, DRAFT_CACHE_KEY};
pub use error::ApplicationError;
pub use ports::{
    ApiError, ChangeType, ChapterGenerationRequest, ChapterStream, ClientEvent,
    ContentGenerationPort, EventSinkPort, KeyValueStorePort, NoopEventSink, StoreError,
    StreamEvent, VersionHistoryPort, VersionRecord,
};
pub use queries::{
    handlers::CompareChapterVersionsHandler, ChapterVersionDiff, CompareChapterVersions,
};
pub use session::{AuthSession, TokenPair, UserProfile};
