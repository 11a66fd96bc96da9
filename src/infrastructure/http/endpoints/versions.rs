//! /api/projects/{id}/versions

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::{ApiError, VersionHistoryPort, VersionRecord};
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::{RollbackOutcome, VersionDiff, VersionList};

impl ApiClient {
    pub async fn list_versions(&self, project_id: Uuid) -> Result<VersionList, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/projects/{}/versions", project_id)))
            .await
    }

    /// 服务端章节级对比
    pub async fn diff_versions(&self, project_id: Uuid, v1: Uuid, v2: Uuid) -> Result<VersionDiff, ApiError> {
        let request = ApiRequest::get(format!("/api/projects/{}/versions/diff", project_id))
            .query("v1", v1)
            .query("v2", v2);
        self.send_json(request).await
    }

    /// 回滚到指定版本，`create_snapshot` 为真时服务端先保存当前状态
    pub async fn rollback_version(
        &self,
        project_id: Uuid,
        version_id: Uuid,
        create_snapshot: bool,
    ) -> Result<RollbackOutcome, ApiError> {
        let request = ApiRequest::post(format!(
            "/api/projects/{}/versions/{}/rollback",
            project_id, version_id
        ))
        .query("create_snapshot", create_snapshot);
        let outcome: RollbackOutcome = self.send_json(request).await?;
        tracing::info!(
            project_id = %project_id,
            target = ?outcome.target_version_number,
            new_version = ?outcome.new_version_number,
            restored = outcome.restored_chapters.len(),
            "Version rolled back"
        );
        Ok(outcome)
    }

    /// 手动创建项目全量快照
    pub async fn create_snapshot(
        &self,
        project_id: Uuid,
        change_summary: Option<&str>,
    ) -> Result<VersionRecord, ApiError> {
        let mut request = ApiRequest::post(format!("/api/projects/{}/versions", project_id));
        if let Some(summary) = change_summary {
            request = request.query("change_summary", summary);
        }
        self.send_json(request).await
    }
}

#[async_trait]
impl VersionHistoryPort for ApiClient {
    async fn get_version(&self, project_id: Uuid, version_id: Uuid) -> Result<VersionRecord, ApiError> {
        self.send_json(ApiRequest::get(format!(
            "/api/projects/{}/versions/{}",
            project_id, version_id
        )))
        .await
    }
}
