//! Event Sink Port - 客户端事件推送
//!
//! 生成进度和会话状态变化通过事件通知上层界面

use serde::Serialize;

use crate::domain::ProgressSnapshot;

/// 客户端事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// 章节开始生成
    ChapterStarted { chapter_id: String },
    /// 章节流式内容更新（累计全文）
    ChapterProgress { chapter_id: String, content: String },
    /// 章节生成完成
    ChapterCompleted { chapter_id: String },
    /// 章节生成失败
    ChapterFailed {
        chapter_id: String,
        title: String,
        error: String,
    },
    /// 本轮生成结束
    GenerationFinished { progress: ProgressSnapshot },
    /// 凭据失效，需要重新登录
    LoginRequired,
}

/// Event Sink Port
pub trait EventSinkPort: Send + Sync {
    fn publish(&self, event: ClientEvent);
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSinkPort for NoopEventSink {
    fn publish(&self, _event: ClientEvent) {}
}
