//! HTTP Layer - 标书后端 REST + 流式接口客户端
//!
//! - client: reqwest 客户端、Bearer 鉴权与单次刷新重放
//! - endpoints: 按资源分组的接口方法
//! - dto: 请求/响应结构
//! - error: 传输错误与后端错误体的映射

mod client;
pub mod dto;
mod endpoints;
mod error;

pub use client::{ApiClient, ApiClientConfig};
pub use endpoints::{document_mime, TextStream, CHAPTER_STREAM_PATH, DOCX_MIME, PDF_MIME};
