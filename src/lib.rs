//! Bidwriter - 标书编写客户端
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Outline: 目录树、叶子章节与生成上下文
//! - Progress: 批量生成进度
//! - Version Diff: 贪心行对比
//!
//! 应用层 (application/):
//! - Ports: 端口定义（后端 API、本地键值存储、事件推送）
//! - Session: 认证会话
//! - Draft Cache: 章节草稿本地镜像
//! - Commands: 章节批量生成、目录变更
//! - Queries: 版本对比
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: reqwest 客户端（Bearer 鉴权 + 单次刷新）
//! - Stream: 事件流按行解码
//! - Persistence: Sled 本地存储
//! - Memory: 内存存储（测试）
//! - Events: 客户端事件广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
