//! Proposal API Port - 标书后端服务抽象
//!
//! 生成编排和版本对比只依赖这里的窄接口，
//! 具体实现在 infrastructure/http（reqwest + SSE 解码）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::local_store::StoreError;
use crate::domain::{ChapterContext, OutlineRef};

/// 后端 API 错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 请求成功送达，但后端在响应体中报告处理失败
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Local storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::NotAuthenticated)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// 流式响应事件
///
/// 同一条流内严格有序：若干 Partial，之后至多一个 Complete 或 Error
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T = String> {
    /// 截至目前的累计全文（不是增量）
    Partial(String),
    /// 终止事件：最终结果
    Complete(T),
    /// 终止事件：服务端报告的错误
    Error(String),
}

impl<T> StreamEvent<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Partial(_))
    }
}

/// 章节事件流
pub type ChapterStream = BoxStream<'static, Result<StreamEvent<String>, ApiError>>;

/// 章节生成请求
#[derive(Debug, Clone)]
pub struct ChapterGenerationRequest {
    pub chapter: OutlineRef,
    pub context: ChapterContext,
    pub project_overview: String,
}

/// Content Generation Port
#[async_trait]
pub trait ContentGenerationPort: Send + Sync {
    /// 发起章节流式生成
    ///
    /// 返回 Err 表示请求被拒绝（网络错误、HTTP 错误、鉴权失败）；
    /// 读流过程中的网络错误以流中的 Err 项出现
    async fn generate_chapter_stream(
        &self,
        request: ChapterGenerationRequest,
    ) -> Result<ChapterStream, ApiError>;
}

/// 版本变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    AiGenerate,
    ManualEdit,
    Proofread,
    Rollback,
}

/// 版本快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub chapter_id: Option<Uuid>,
    pub version_number: i64,
    pub change_type: ChangeType,
    pub change_summary: Option<String>,
    #[serde(default)]
    pub snapshot_data: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl VersionRecord {
    /// 从快照中提取章节正文
    ///
    /// 项目快照形如 `{"chapters": [{"id": ..., "content": ...}]}`，按章节 ID 查找；
    /// 章节快照直接带 `content` 字段。正文为 null 时视为空字符串。
    pub fn chapter_content(&self, chapter_id: Option<&str>) -> Option<String> {
        let text_of = |value: &serde_json::Value| match value.get("content") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => Some(String::new()),
            Some(_) => None,
        };

        if let (Some(id), Some(chapters)) = (
            chapter_id,
            self.snapshot_data.get("chapters").and_then(|c| c.as_array()),
        ) {
            return chapters
                .iter()
                .find(|ch| ch.get("id").and_then(|v| v.as_str()) == Some(id))
                .and_then(text_of);
        }

        match self.snapshot_data.get("content") {
            Some(_) => text_of(&self.snapshot_data),
            None => None,
        }
    }
}

/// Version History Port
#[async_trait]
pub trait VersionHistoryPort: Send + Sync {
    async fn get_version(&self, project_id: Uuid, version_id: Uuid) -> Result<VersionRecord, ApiError>;
}
