//! Word 导出

use crate::application::ports::ApiError;
use crate::application::validation::validate_required;
use crate::domain::Outline;
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::ExportRequest;

impl ApiClient {
    /// 导出为 .docx，返回文件字节
    pub async fn export_word(
        &self,
        project_name: &str,
        project_overview: &str,
        outline: &Outline,
    ) -> Result<Vec<u8>, ApiError> {
        validate_required("项目名称", project_name)?;
        let request = ApiRequest::post("/api/document/export-word")
            .streaming()
            .json(&ExportRequest {
                project_name: project_name.to_string(),
                project_overview: project_overview.to_string(),
                outline: outline.items().to_vec(),
            })?;
        let bytes = self.send_bytes(request).await?;
        tracing::info!(size = bytes.len(), "Document exported");
        Ok(bytes)
    }
}
