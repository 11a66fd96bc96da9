//! /api/projects

use uuid::Uuid;

use crate::application::ports::ApiError;
use crate::application::validation::validate_project_name;
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::{
    AddMemberRequest, ConsistencyReport, CreateProjectRequest, MemberRecord, MemberRole,
    ProjectDetail, ProjectMember, ProjectProgress, ProjectSummary, UpdateProjectRequest,
};

impl ApiClient {
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        self.send_json(ApiRequest::get("/api/projects")).await
    }

    pub async fn get_project(&self, project_id: Uuid) -> Result<ProjectDetail, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/projects/{}", project_id)))
            .await
    }

    pub async fn create_project(&self, name: &str, description: Option<String>) -> Result<ProjectDetail, ApiError> {
        validate_project_name(name)?;
        let request = ApiRequest::post("/api/projects").json(&CreateProjectRequest {
            name: name.trim().to_string(),
            description,
        })?;
        let project: ProjectDetail = self.send_json(request).await?;
        tracing::info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    pub async fn update_project(
        &self,
        project_id: Uuid,
        update: &UpdateProjectRequest,
    ) -> Result<ProjectDetail, ApiError> {
        if let Some(name) = &update.name {
            validate_project_name(name)?;
        }
        let request = ApiRequest::put(format!("/api/projects/{}", project_id)).json(update)?;
        self.send_json(request).await
    }

    pub async fn delete_project(&self, project_id: Uuid) -> Result<(), ApiError> {
        self.send_empty(ApiRequest::delete(format!("/api/projects/{}", project_id)))
            .await?;
        tracing::info!(project_id = %project_id, "Project deleted");
        Ok(())
    }

    pub async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/projects/{}/members", project_id)))
            .await
    }

    pub async fn add_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<MemberRecord, ApiError> {
        let request = ApiRequest::post(format!("/api/projects/{}/members", project_id))
            .json(&AddMemberRequest { user_id, role })?;
        self.send_json(request).await
    }

    pub async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        self.send_empty(ApiRequest::delete(format!(
            "/api/projects/{}/members/{}",
            project_id, user_id
        )))
        .await
    }

    pub async fn project_progress(&self, project_id: Uuid) -> Result<ProjectProgress, ApiError> {
        self.send_json(ApiRequest::get(format!("/api/projects/{}/progress", project_id)))
            .await
    }

    /// 跨章节一致性检查，耗时较长，按流式请求发送以避开整体超时
    pub async fn check_consistency(&self, project_id: Uuid) -> Result<ConsistencyReport, ApiError> {
        let request = ApiRequest::post(format!("/api/projects/{}/consistency-check", project_id)).streaming();
        let report: ConsistencyReport = self.send_json(request).await?;
        tracing::info!(
            project_id = %project_id,
            contradictions = report.contradiction_count,
            critical = report.critical_count,
            "Consistency check finished"
        );
        Ok(report)
    }
}
