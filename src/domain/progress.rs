//! 章节生成进度
//!
//! 每次生成运行重置，只由生成编排器修改。

use serde::Serialize;
use std::collections::BTreeSet;

/// 生成进度
///
/// 不变量:
/// - 每个章节 completed 只累加一次（成功或失败）
/// - 同一章节不会同时出现两次在 generating 集合中
#[derive(Debug, Clone, Default)]
pub struct GenerationProgress {
    total: usize,
    completed: usize,
    generating: BTreeSet<String>,
    failed: Vec<String>,
}

/// 进度快照（用于展示和事件推送）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    pub generating: Vec<String>,
    pub failed: Vec<String>,
}

impl GenerationProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 标记章节开始生成
    ///
    /// 章节已在生成中时返回 false，调用方不得重复发起请求
    pub fn begin(&mut self, chapter_id: &str) -> bool {
        self.generating.insert(chapter_id.to_string())
    }

    /// 章节生成成功
    pub fn finish_success(&mut self, chapter_id: &str) -> bool {
        if !self.generating.remove(chapter_id) {
            return false;
        }
        self.completed += 1;
        true
    }

    /// 章节生成失败，记录章节标题
    pub fn finish_failure(&mut self, chapter_id: &str, title: &str) -> bool {
        if !self.generating.remove(chapter_id) {
            return false;
        }
        self.completed += 1;
        self.failed.push(title.to_string());
        true
    }

    pub fn is_generating(&self, chapter_id: &str) -> bool {
        self.generating.contains(chapter_id)
    }

    pub fn generating_count(&self) -> usize {
        self.generating.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total && self.generating.is_empty()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            completed: self.completed,
            generating: self.generating.iter().cloned().collect(),
            failed: self.failed.clone(),
        }
    }
}
