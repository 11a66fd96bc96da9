//! 批注

use uuid::Uuid;

use crate::application::ports::ApiError;
use crate::application::validation::validate_required;
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::{Comment, CommentList, CreateCommentRequest};

impl ApiClient {
    pub async fn list_comments(&self, chapter_id: Uuid) -> Result<CommentList, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/chapters/{}/comments", chapter_id)))
            .await
    }

    pub async fn create_comment(
        &self,
        chapter_id: Uuid,
        request: CreateCommentRequest,
    ) -> Result<Comment, ApiError> {
        validate_required("批注内容", &request.content)?;
        if let (Some(start), Some(end)) = (request.position_start, request.position_end) {
            if start > end {
                return Err(ApiError::validation("批注起始位置不能大于结束位置"));
            }
        }
        let request = ApiRequest::post(format!("/api/chapters/{}/comments", chapter_id)).json(&request)?;
        self.send_json(request).await
    }

    pub async fn resolve_comment(&self, comment_id: Uuid) -> Result<Comment, ApiError> {
        self.send_json(ApiRequest::put(format!("/api/comments/{}/resolve", comment_id)))
            .await
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> Result<(), ApiError> {
        self.send_empty(ApiRequest::delete(format!("/api/comments/{}", comment_id)))
            .await
    }
}
