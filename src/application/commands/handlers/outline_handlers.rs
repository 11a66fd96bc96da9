//! Outline Command Handlers

use std::sync::Arc;

use crate::application::commands::{ApplyOutlineCommand, ApplyOutlineResponse};
use crate::application::draft_cache::DraftCache;
use crate::application::error::ApplicationError;

/// ApplyOutline Handler - 目录变更后对账本地草稿并填充视图
pub struct ApplyOutlineHandler {
    drafts: Arc<DraftCache>,
}

impl ApplyOutlineHandler {
    pub fn new(drafts: Arc<DraftCache>) -> Self {
        Self { drafts }
    }

    /// 先裁剪掉已不存在的章节草稿并写回，再用剩余草稿填充叶子章节正文
    pub fn handle(&self, command: ApplyOutlineCommand) -> Result<ApplyOutlineResponse, ApplicationError> {
        let mut outline = command.outline;
        let kept = self.drafts.reconcile(&outline.leaf_ids())?;

        let mut restored = 0;
        for (chapter_id, content) in kept {
            outline.set_content(&chapter_id, content)?;
            restored += 1;
        }

        tracing::info!(
            leaves = outline.collect_leaf_items().len(),
            restored = restored,
            "Outline applied"
        );

        Ok(ApplyOutlineResponse { outline, restored })
    }
}
