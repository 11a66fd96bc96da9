//! Domain Layer - 领域层
//!
//! 包含:
//! - Outline Context: 标书目录树与章节上下文
//! - 生成进度统计
//! - 版本差异（仅用于展示）

pub mod outline;
pub mod progress;
pub mod version_diff;

pub use outline::{ChapterContext, Outline, OutlineError, OutlineItem, OutlineRef};
pub use progress::{GenerationProgress, ProgressSnapshot};
pub use version_diff::{diff_lines, DiffKind, DiffLine, DiffView, DIFF_DISPLAY_LIMIT};
