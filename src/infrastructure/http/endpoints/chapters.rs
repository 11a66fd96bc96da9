//! /api/chapters 与章节正文生成

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use uuid::Uuid;

use crate::application::ports::{
    ApiError, ChapterGenerationRequest, ChapterStream, ContentGenerationPort, StreamEvent,
};
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::{
    ChapterContentRequest, ChapterDetail, ChapterStatus, GeneratedContent, LockStatus,
    ProofreadResult, UpdateContentRequest, UpdateStatusRequest,
};
use crate::infrastructure::stream::{ChapterEnvelopeDecoder, ProofreadDecoder};

pub const CHAPTER_STREAM_PATH: &str = "/api/content/generate-chapter-stream";
const CHAPTER_PATH: &str = "/api/content/generate-chapter";

impl From<ChapterGenerationRequest> for ChapterContentRequest {
    fn from(request: ChapterGenerationRequest) -> Self {
        Self {
            chapter: request.chapter,
            parent_chapters: request.context.parent_chapters,
            sibling_chapters: request.context.sibling_chapters,
            project_overview: request.project_overview,
        }
    }
}

impl ApiClient {
    pub async fn get_chapter(&self, chapter_id: Uuid) -> Result<ChapterDetail, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/chapters/{}", chapter_id)))
            .await
    }

    pub async fn lock_chapter(&self, chapter_id: Uuid) -> Result<LockStatus, ApiError> {
        self.send_json(ApiRequest::post(format!("/api/chapters/{}/lock", chapter_id)))
            .await
    }

    pub async fn unlock_chapter(&self, chapter_id: Uuid) -> Result<LockStatus, ApiError> {
        self.send_json(ApiRequest::post(format!("/api/chapters/{}/unlock", chapter_id)))
            .await
    }

    /// 保存正文，服务端要求当前用户持有章节锁
    pub async fn update_chapter_content(
        &self,
        chapter_id: Uuid,
        content: String,
        change_summary: Option<String>,
    ) -> Result<ChapterDetail, ApiError> {
        let request = ApiRequest::put(format!("/api/chapters/{}/content", chapter_id)).json(
            &UpdateContentRequest {
                content,
                change_summary,
            },
        )?;
        self.send_json(request).await
    }

    pub async fn update_chapter_status(
        &self,
        chapter_id: Uuid,
        status: ChapterStatus,
    ) -> Result<ChapterDetail, ApiError> {
        let request = ApiRequest::put(format!("/api/chapters/{}/status", chapter_id))
            .json(&UpdateStatusRequest { status })?;
        self.send_json(request).await
    }

    /// 非流式章节生成
    pub async fn generate_chapter(&self, request: ChapterGenerationRequest) -> Result<String, ApiError> {
        let request = ApiRequest::post(CHAPTER_PATH)
            .streaming()
            .json(&ChapterContentRequest::from(request))?;
        let generated: GeneratedContent = self.send_json(request).await?;
        Ok(generated.content)
    }

    /// 流式校对章节
    pub async fn proofread_stream(
        &self,
        chapter_id: Uuid,
    ) -> Result<BoxStream<'static, Result<StreamEvent<ProofreadResult>, ApiError>>, ApiError> {
        let request = ApiRequest::post(format!("/api/chapters/{}/proofread-stream", chapter_id));
        self.open_stream(request, ProofreadDecoder::new()).await
    }
}

#[async_trait]
impl ContentGenerationPort for ApiClient {
    async fn generate_chapter_stream(
        &self,
        request: ChapterGenerationRequest,
    ) -> Result<ChapterStream, ApiError> {
        let chapter_id = request.chapter.id.clone();
        let request = ApiRequest::post(CHAPTER_STREAM_PATH).json(&ChapterContentRequest::from(request))?;
        let stream = self.open_stream(request, ChapterEnvelopeDecoder::new()).await?;
        tracing::debug!(chapter_id = %chapter_id, "Chapter stream opened");
        Ok(stream)
    }
}
