//! /api/outline

use futures_util::stream::BoxStream;
use uuid::Uuid;

use crate::application::ports::{ApiError, StreamEvent};
use crate::application::validation::validate_required;
use crate::domain::Outline;
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::{OutlineRequest, ProjectContentRequest, ProjectOutline, ProjectOutlineRequest};
use crate::infrastructure::stream::{collect_complete, ChunkDeltaDecoder};

/// 增量文本流，Partial 为累计文本，Complete 为全文
pub type TextStream = BoxStream<'static, Result<StreamEvent<String>, ApiError>>;

impl ApiClient {
    /// 流式生成目录（JSON 文本逐段返回）
    pub async fn generate_outline_stream(&self, request: &OutlineRequest) -> Result<TextStream, ApiError> {
        validate_required("项目概述", &request.overview)?;
        let request = ApiRequest::post("/api/outline/generate-stream").json(request)?;
        self.open_stream(request, ChunkDeltaDecoder::new()).await
    }

    /// 生成目录并解析为目录树
    ///
    /// 服务端计算期间只发心跳，完成后一次性分片发送结果
    pub async fn generate_outline(&self, request: &OutlineRequest) -> Result<Outline, ApiError> {
        validate_required("项目概述", &request.overview)?;
        let request = ApiRequest::post("/api/outline/generate").json(request)?;
        let text = collect_complete(self.open_stream(request, ChunkDeltaDecoder::new()).await?).await?;

        let outline = Outline::from_json(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        tracing::info!(
            top_level = outline.items().len(),
            leaves = outline.collect_leaf_items().len(),
            "Outline generated"
        );
        Ok(outline)
    }

    /// 按项目已分析的招标文件生成目录，服务端同时写入章节表
    pub async fn generate_project_outline_stream(&self, project_id: Uuid) -> Result<TextStream, ApiError> {
        let request = ApiRequest::post("/api/outline/generate-project-stream").json(&ProjectOutlineRequest {
            project_id: project_id.to_string(),
        })?;
        self.open_stream(request, ChunkDeltaDecoder::new()).await
    }

    pub async fn project_chapters(&self, project_id: Uuid) -> Result<ProjectOutline, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/outline/project-chapters/{}", project_id)))
            .await
    }

    /// 生成项目内单个章节的正文，服务端保存并创建版本快照
    pub async fn generate_project_content_stream(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<TextStream, ApiError> {
        let request = ApiRequest::post("/api/outline/generate-content-stream").json(&ProjectContentRequest {
            project_id: project_id.to_string(),
            chapter_id: chapter_id.to_string(),
        })?;
        self.open_stream(request, ChunkDeltaDecoder::new()).await
    }
}
