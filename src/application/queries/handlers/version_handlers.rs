//! Version Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::VersionHistoryPort;
use crate::application::queries::{ChapterVersionDiff, CompareChapterVersions};
use crate::domain::DiffView;

/// CompareChapterVersions Handler
pub struct CompareChapterVersionsHandler {
    versions: Arc<dyn VersionHistoryPort>,
}

impl CompareChapterVersionsHandler {
    pub fn new(versions: Arc<dyn VersionHistoryPort>) -> Self {
        Self { versions }
    }

    pub async fn handle(
        &self,
        query: CompareChapterVersions,
    ) -> Result<ChapterVersionDiff, ApplicationError> {
        let old = self
            .versions
            .get_version(query.project_id, query.old_version_id)
            .await?;
        let new = self
            .versions
            .get_version(query.project_id, query.new_version_id)
            .await?;

        let chapter_id = query.chapter_id.as_deref();
        let old_text = old
            .chapter_content(chapter_id)
            .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id.unwrap_or("-")))?;
        let new_text = new
            .chapter_content(chapter_id)
            .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id.unwrap_or("-")))?;

        let view = DiffView::compare(&old_text, &new_text);
        tracing::debug!(
            old_version = old.version_number,
            new_version = new.version_number,
            added = view.added,
            removed = view.removed,
            "Versions compared"
        );

        Ok(ChapterVersionDiff {
            old_version_number: old.version_number,
            new_version_number: new.version_number,
            view,
        })
    }
}
