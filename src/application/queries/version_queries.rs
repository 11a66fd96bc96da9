//! Version Queries - 版本对比查询

use uuid::Uuid;

use crate::domain::DiffView;

/// 对比某章节在两个版本中的正文
#[derive(Debug, Clone)]
pub struct CompareChapterVersions {
    pub project_id: Uuid,
    pub old_version_id: Uuid,
    pub new_version_id: Uuid,
    /// 项目级快照中按章节 ID 提取；章节快照可为空
    pub chapter_id: Option<String>,
}

/// 对比结果
#[derive(Debug, Clone)]
pub struct ChapterVersionDiff {
    pub old_version_number: i64,
    pub new_version_number: i64,
    pub view: DiffView,
}
