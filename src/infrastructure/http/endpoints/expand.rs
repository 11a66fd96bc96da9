//! /api/expand - 招标文件上传与文本提取

use std::path::Path;

use crate::application::ports::ApiError;
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::FileUploadResponse;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const PDF_MAGIC: &[u8] = b"%PDF-";
const DOCX_MAGIC: &[u8] = b"PK\x03\x04";

/// 按文件头判断文档类型，只接受 PDF 与 Word（docx）
pub fn document_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PDF_MAGIC) {
        Some(PDF_MIME)
    } else if bytes.starts_with(DOCX_MAGIC) {
        Some(DOCX_MIME)
    } else {
        None
    }
}

impl ApiClient {
    /// 上传本地招标文件，返回后端提取的文本
    pub async fn upload_document(&self, path: &Path) -> Result<FileUploadResponse, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::validation(format!("无法读取文件 {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.upload_document_bytes(&file_name, bytes).await
    }

    /// 上传文档字节
    ///
    /// 文件头不是 PDF 或 docx 时不发请求；后端以 `success: false` 报告的失败转为 Rejected
    pub async fn upload_document_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileUploadResponse, ApiError> {
        let mime = document_mime(&bytes).ok_or_else(|| {
            ApiError::validation(format!(
                "文件 {} 的实际内容不是有效的 PDF 或 Word 文档",
                file_name
            ))
        })?;

        tracing::info!(file_name = %file_name, mime = %mime, size = bytes.len(), "Uploading document");
        let request = ApiRequest::post("/api/expand/upload")
            .streaming()
            .file("file", file_name, mime, bytes);
        let response: FileUploadResponse = self.send_json(request).await?;

        if !response.success {
            tracing::warn!(message = %response.message, "Document upload rejected");
            return Err(ApiError::Rejected(response.message));
        }
        Ok(response)
    }
}
