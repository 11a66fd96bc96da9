//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：章节生成、目录变更

mod generation_commands;
mod outline_commands;

pub mod handlers;

pub use generation_commands::*;
pub use outline_commands::*;
