//! Generation Command Handlers - 章节内容批量生成
//!
//! 叶子章节按固定大小分批，每批内并发发起流式生成请求，整批结束后再开始下一批。
//! 单个章节失败只记录在失败列表中，不影响同批或后续批次。

use dashmap::DashMap;
use futures_util::future::join_all;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::commands::{
    GenerateChapterContentsCommand, GenerateChapterContentsResponse,
};
use crate::application::draft_cache::DraftCache;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterGenerationRequest, ClientEvent, ContentGenerationPort, EventSinkPort, StreamEvent,
};
use crate::domain::{ChapterContext, GenerationProgress, OutlineRef, ProgressSnapshot};

/// 默认同时进行的生成请求数
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// 单个叶子章节的生成任务
#[derive(Debug, Clone)]
struct LeafJob {
    chapter: OutlineRef,
    context: ChapterContext,
}

/// 运行标记，离开作用域时复位
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// GenerateChapterContents Handler - 生成编排器
pub struct GenerateChapterContentsHandler {
    generator: Arc<dyn ContentGenerationPort>,
    drafts: Arc<DraftCache>,
    events: Arc<dyn EventSinkPort>,
    max_concurrent: usize,
    progress: Mutex<GenerationProgress>,
    running: AtomicBool,
}

impl GenerateChapterContentsHandler {
    pub fn new(
        generator: Arc<dyn ContentGenerationPort>,
        drafts: Arc<DraftCache>,
        events: Arc<dyn EventSinkPort>,
    ) -> Self {
        Self {
            generator,
            drafts,
            events,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            progress: Mutex::new(GenerationProgress::default()),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// 当前进度快照
    pub fn progress(&self) -> ProgressSnapshot {
        self.with_progress(|p| p.snapshot())
    }

    pub async fn handle(
        &self,
        command: GenerateChapterContentsCommand,
    ) -> Result<GenerateChapterContentsResponse, ApplicationError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ApplicationError::invalid_state(
                "Chapter generation is already running",
            ));
        }
        let _guard = RunGuard(&self.running);

        let outline = command.outline;
        let jobs: Vec<LeafJob> = outline
            .collect_leaf_items()
            .into_iter()
            .map(|item| LeafJob {
                chapter: item.as_ref_item(),
                context: outline.context_for(&item.id).unwrap_or_default(),
            })
            .collect();

        self.with_progress(|p| *p = GenerationProgress::new(jobs.len()));

        tracing::info!(
            total = jobs.len(),
            max_concurrent = self.max_concurrent,
            "Chapter generation started"
        );

        let contents: DashMap<String, String> = DashMap::new();
        for (batch_index, batch) in jobs.chunks(self.max_concurrent).enumerate() {
            tracing::debug!(batch = batch_index, size = batch.len(), "Starting batch");
            join_all(
                batch
                    .iter()
                    .map(|job| self.generate_one(job, &command.project_overview, &contents)),
            )
            .await;
        }

        let mut outline = outline;
        for entry in contents.iter() {
            if let Err(e) = outline.set_content(entry.key(), entry.value().clone()) {
                tracing::warn!(chapter_id = %entry.key(), error = %e, "Failed to merge content");
            }
        }

        let progress = self.progress();
        tracing::info!(
            total = progress.total,
            completed = progress.completed,
            failed = progress.failed.len(),
            "Chapter generation finished"
        );
        self.events.publish(ClientEvent::GenerationFinished {
            progress: progress.clone(),
        });

        Ok(GenerateChapterContentsResponse { outline, progress })
    }

    /// 生成单个章节，结果只体现在进度和事件中
    async fn generate_one(
        &self,
        job: &LeafJob,
        project_overview: &str,
        contents: &DashMap<String, String>,
    ) {
        let chapter_id = job.chapter.id.as_str();
        if !self.with_progress(|p| p.begin(chapter_id)) {
            tracing::warn!(chapter_id = %chapter_id, "Chapter already generating, skipping");
            return;
        }
        self.events.publish(ClientEvent::ChapterStarted {
            chapter_id: chapter_id.to_string(),
        });

        match self.stream_chapter(job, project_overview, contents).await {
            Ok(()) => {
                self.with_progress(|p| p.finish_success(chapter_id));
                tracing::info!(chapter_id = %chapter_id, "Chapter generated");
                self.events.publish(ClientEvent::ChapterCompleted {
                    chapter_id: chapter_id.to_string(),
                });
            }
            Err(error) => {
                self.with_progress(|p| p.finish_failure(chapter_id, &job.chapter.title));
                tracing::error!(
                    chapter_id = %chapter_id,
                    title = %job.chapter.title,
                    error = %error,
                    "Chapter generation failed"
                );
                self.events.publish(ClientEvent::ChapterFailed {
                    chapter_id: chapter_id.to_string(),
                    title: job.chapter.title.clone(),
                    error,
                });
            }
        }
    }

    async fn stream_chapter(
        &self,
        job: &LeafJob,
        project_overview: &str,
        contents: &DashMap<String, String>,
    ) -> Result<(), String> {
        let request = ChapterGenerationRequest {
            chapter: job.chapter.clone(),
            context: job.context.clone(),
            project_overview: project_overview.to_string(),
        };

        let mut stream = self
            .generator
            .generate_chapter_stream(request)
            .await
            .map_err(|e| e.to_string())?;

        let chapter_id = job.chapter.id.as_str();
        while let Some(event) = stream.next().await {
            match event.map_err(|e| e.to_string())? {
                StreamEvent::Partial(text) => {
                    self.record(chapter_id, text, contents);
                }
                StreamEvent::Complete(text) => {
                    self.record(chapter_id, text, contents);
                    return Ok(());
                }
                StreamEvent::Error(message) => return Err(message),
            }
        }

        // 流结束但没有终止事件：已收到的最后一段即为最终内容
        match contents.get(chapter_id) {
            Some(content) => {
                tracing::debug!(chapter_id = %chapter_id, "Stream ended without completion marker");
                self.persist_draft(chapter_id, content.value());
                Ok(())
            }
            None => Err("Stream ended without content".to_string()),
        }
    }

    /// 覆盖写入内存中的章节正文并同步到本地草稿
    fn record(&self, chapter_id: &str, text: String, contents: &DashMap<String, String>) {
        self.persist_draft(chapter_id, &text);
        self.events.publish(ClientEvent::ChapterProgress {
            chapter_id: chapter_id.to_string(),
            content: text.clone(),
        });
        contents.insert(chapter_id.to_string(), text);
    }

    fn persist_draft(&self, chapter_id: &str, text: &str) {
        if let Err(e) = self.drafts.upsert(chapter_id, text) {
            tracing::warn!(chapter_id = %chapter_id, error = %e, "Failed to persist draft");
        }
    }

    fn with_progress<T>(&self, f: impl FnOnce(&mut GenerationProgress) -> T) -> T {
        let mut progress = self.progress.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut progress)
    }
}
