//! Outline Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutlineError {
    #[error("章节 ID 不能为空")]
    EmptyId,

    #[error("章节 ID 重复: {0}")]
    DuplicateId(String),

    #[error("章节不存在: {0}")]
    NotFound(String),

    #[error("非叶子章节不能保存正文: {0}")]
    NotALeaf(String),

    #[error("目录解析失败: {0}")]
    Parse(String),
}
