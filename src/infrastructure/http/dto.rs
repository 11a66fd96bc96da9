//! Data Transfer Objects - 后端接口的请求与响应结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::{ChangeType, VersionRecord};
use crate::domain::{OutlineItem, OutlineRef};

// ============================================================================
// Auth DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    /// 用户名或邮箱
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ============================================================================
// Project DTOs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    InProgress,
    Reviewing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Editor,
    Reviewer,
}

/// 项目列表项（不含大文本字段）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Option<Uuid>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Option<Uuid>,
    pub status: ProjectStatus,
    pub file_content: Option<String>,
    pub project_overview: Option<String>,
    pub tech_requirements: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 项目更新，只发送设置过的字段
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_requirements: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectMember {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemberRecord {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// 项目进度（按章节状态计数）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectProgress {
    pub total_chapters: u32,
    pub pending: u32,
    pub generated: u32,
    pub reviewing: u32,
    pub finalized: u32,
    pub completion_percentage: f64,
}

// ============================================================================
// Consistency DTOs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyCategory {
    Data,
    Terminology,
    Timeline,
    Commitment,
    Scope,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Contradiction {
    pub severity: IssueSeverity,
    pub category: ConsistencyCategory,
    pub description: String,
    pub chapter_a: String,
    pub chapter_b: String,
    #[serde(default)]
    pub detail_a: String,
    #[serde(default)]
    pub detail_b: String,
    #[serde(default)]
    pub suggestion: String,
}

/// 跨章节一致性检查结果
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsistencyReport {
    #[serde(default)]
    pub contradictions: Vec<Contradiction>,
    #[serde(default)]
    pub summary: String,
    /// consistent / minor_issues / major_issues
    pub overall_consistency: String,
    pub contradiction_count: u32,
    pub critical_count: u32,
    pub created_at: Option<DateTime<Utc>>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.overall_consistency == "consistent"
    }
}

// ============================================================================
// Outline DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct OutlineRequest {
    pub overview: String,
    pub requirements: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectOutlineRequest {
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectContentRequest {
    pub project_id: String,
    pub chapter_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectChapter {
    pub id: String,
    pub chapter_number: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub status: ChapterStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectOutline {
    pub project_id: String,
    pub chapters: Vec<ProjectChapter>,
    pub total_count: u32,
}

// ============================================================================
// Chapter DTOs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    Pending,
    Generated,
    Reviewing,
    Finalized,
}

impl std::str::FromStr for ChapterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "generated" => Ok(Self::Generated),
            "reviewing" => Ok(Self::Reviewing),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("未知章节状态: {}", other)),
        }
    }
}

/// 章节详情（含锁信息）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChapterDetail {
    pub id: String,
    pub chapter_number: String,
    pub title: String,
    pub content: Option<String>,
    pub status: ChapterStatus,
    pub locked_by: Option<String>,
    pub locked_at: Option<String>,
    pub locked_by_username: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub lock_expired: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockStatus {
    pub success: bool,
    pub chapter_id: String,
    pub locked_by: Option<String>,
    pub locked_at: Option<String>,
    pub locked_by_username: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateContentRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateStatusRequest {
    pub status: ChapterStatus,
}

/// 章节生成请求体：目标章节 + 上级/同级上下文
#[derive(Debug, Clone, Serialize)]
pub struct ChapterContentRequest {
    pub chapter: OutlineRef,
    pub parent_chapters: Vec<OutlineRef>,
    pub sibling_chapters: Vec<OutlineRef>,
    pub project_overview: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedContent {
    pub content: String,
}

// ============================================================================
// Proofread DTOs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Compliance,
    Language,
    Consistency,
    Redundancy,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProofreadIssue {
    pub severity: IssueSeverity,
    pub category: IssueCategory,
    #[serde(default)]
    pub position: String,
    pub issue: String,
    #[serde(default)]
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProofreadResult {
    #[serde(default)]
    pub issues: Vec<ProofreadIssue>,
    #[serde(default)]
    pub summary: String,
}

impl ProofreadResult {
    pub fn critical_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Critical)
            .count()
    }
}

// ============================================================================
// Version DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionSummary {
    pub id: Uuid,
    pub project_id: Uuid,
    pub chapter_id: Option<Uuid>,
    pub version_number: i64,
    pub change_type: ChangeType,
    pub change_summary: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionList {
    pub items: Vec<VersionSummary>,
    pub total: u32,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionBrief {
    pub id: String,
    pub version_number: i64,
    pub created_at: String,
    pub change_type: ChangeType,
}

/// 服务端章节级版本对比
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionDiff {
    pub v1: VersionBrief,
    pub v2: VersionBrief,
    /// 章节增删改明细，结构由服务端决定
    pub diff: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RestoredChapter {
    pub id: String,
    #[serde(default)]
    pub chapter_number: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RollbackOutcome {
    pub success: bool,
    pub target_version_number: Option<i64>,
    pub new_version_id: Option<String>,
    pub new_version_number: Option<i64>,
    pub pre_snapshot_id: Option<String>,
    #[serde(default)]
    pub restored_chapters: Vec<RestoredChapter>,
    pub error: Option<String>,
}

/// 版本快照原样复用应用层类型
pub type VersionDetail = VersionRecord;

// ============================================================================
// Comment DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comment {
    pub id: String,
    pub chapter_id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub position_start: Option<u32>,
    pub position_end: Option<u32>,
    pub is_resolved: bool,
    pub resolved_by: Option<String>,
    pub resolved_by_username: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentList {
    pub items: Vec<Comment>,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_end: Option<u32>,
}

// ============================================================================
// Document Upload DTOs
// ============================================================================

/// 上传招标文件后的解析结果
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileUploadResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// 从文档中提取的全文，用作项目概述
    pub file_content: Option<String>,
    /// 文档自带目录的 JSON 文本
    pub old_outline: Option<String>,
}

// ============================================================================
// Export DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    pub project_name: String,
    pub project_overview: String,
    pub outline: Vec<OutlineItem>,
}
