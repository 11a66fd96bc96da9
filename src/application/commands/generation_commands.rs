//! Generation Commands - 章节内容生成命令

use crate::domain::{Outline, ProgressSnapshot};

/// 为目录中所有叶子章节生成正文
#[derive(Debug, Clone)]
pub struct GenerateChapterContentsCommand {
    pub outline: Outline,
    /// 项目概述，作为所有章节的共享上下文
    pub project_overview: String,
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct GenerateChapterContentsResponse {
    /// 合并了生成内容的目录
    pub outline: Outline,
    pub progress: ProgressSnapshot,
}

impl GenerateChapterContentsResponse {
    pub fn succeeded(&self) -> usize {
        self.progress.completed - self.progress.failed.len()
    }
}
