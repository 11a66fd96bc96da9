//! Outline Commands - 目录变更命令

use crate::domain::Outline;

/// 应用新的目录（生成、编辑或重新加载之后）
#[derive(Debug, Clone)]
pub struct ApplyOutlineCommand {
    pub outline: Outline,
}

/// 应用目录响应
#[derive(Debug, Clone)]
pub struct ApplyOutlineResponse {
    /// 已用本地草稿填充正文的目录
    pub outline: Outline,
    /// 从草稿恢复的章节数
    pub restored: usize,
}
