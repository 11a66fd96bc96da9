//! Outline Context - 标书目录限界上下文
//!
//! 职责:
//! - 目录树实体（容器节点 / 叶子章节）
//! - 叶子章节收集（深度优先、从左到右）
//! - 章节生成上下文（上级链 + 同级章节）

mod aggregate;
mod entities;
mod errors;

pub use aggregate::Outline;
pub use entities::{ChapterContext, OutlineItem, OutlineRef};
pub use errors::OutlineError;
