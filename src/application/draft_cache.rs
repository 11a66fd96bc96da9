//! 本地章节草稿缓存
//!
//! 所有草稿以 JSON 对象（chapter_id -> content）整体存放在一个固定 key 下。
//! 读取时数据缺失或损坏都视为空缓存；存储本身的读取错误在写入路径上向上传递，
//! 不会用空集合覆盖已有草稿。

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::application::ports::{KeyValueStorePort, StoreError};

/// 草稿缓存在本地存储中的 key
pub const DRAFT_CACHE_KEY: &str = "chapter_drafts";

/// chapter_id -> 最新已知正文
pub type DraftEntries = BTreeMap<String, String>;

/// 章节草稿缓存
///
/// 每次写入都是读取-修改-整体写回，由内部锁串行化，
/// 不同章节的并发写入互不覆盖。
pub struct DraftCache {
    store: Arc<dyn KeyValueStorePort>,
    write_lock: Mutex<()>,
}

impl DraftCache {
    pub fn new(store: Arc<dyn KeyValueStorePort>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// 读取全部草稿（仅用于展示），读取失败时返回空集合
    pub fn load(&self) -> DraftEntries {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read draft cache, treating as empty");
            DraftEntries::new()
        })
    }

    /// 读取全部草稿，存储错误向上传递，缺失或损坏的数据视为空
    fn try_load(&self) -> Result<DraftEntries, StoreError> {
        let Some(raw) = self.store.get(DRAFT_CACHE_KEY)? else {
            return Ok(DraftEntries::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Corrupted draft cache, treating as empty");
            DraftEntries::new()
        }))
    }

    /// 写入（覆盖）单个章节草稿
    pub fn upsert(&self, chapter_id: &str, content: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.try_load()?;
        entries.insert(chapter_id.to_string(), content.to_string());
        self.write(&entries)
    }

    /// 只保留 key 属于当前叶子章节集合的草稿
    pub fn filter_by_leaves(&self, leaf_ids: &HashSet<String>) -> DraftEntries {
        retain_leaves(self.load(), leaf_ids)
    }

    /// 整体替换持久化的草稿集合
    pub fn save_all(&self, entries: &DraftEntries) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write(entries)
    }

    /// 目录变更后的对账：过滤并写回，在同一把锁内完成
    pub fn reconcile(&self, leaf_ids: &HashSet<String>) -> Result<DraftEntries, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let before = self.try_load()?;
        let before_len = before.len();
        let kept = retain_leaves(before, leaf_ids);
        self.write(&kept)?;

        tracing::debug!(
            kept = kept.len(),
            pruned = before_len - kept.len(),
            "Draft cache reconciled"
        );
        Ok(kept)
    }

    /// 清空全部草稿
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.store.delete(DRAFT_CACHE_KEY)
    }

    fn write(&self, entries: &DraftEntries) -> Result<(), StoreError> {
        let raw = serde_json::to_string(entries)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        self.store.set(DRAFT_CACHE_KEY, &raw)
    }
}

fn retain_leaves(mut entries: DraftEntries, leaf_ids: &HashSet<String>) -> DraftEntries {
    entries.retain(|id, _| leaf_ids.contains(id));
    entries
}
