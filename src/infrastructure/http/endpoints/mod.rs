//! 后端接口分组，每组是 ApiClient 上的一组方法

mod auth;
mod chapters;
mod comments;
mod expand;
mod export;
mod outline;
mod projects;
mod versions;

pub use chapters::CHAPTER_STREAM_PATH;
pub use expand::{document_mime, DOCX_MIME, PDF_MIME};
pub use outline::TextStream;
