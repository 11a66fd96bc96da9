//! Sled-based Key-Value Store Implementation
//!
//! 所有客户端状态（令牌、用户信息、章节草稿）存放在同一个 Sled 数据库中，
//! key 加 `kv:` 前缀。

use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{KeyValueStorePort, StoreError};

const KEY_PREFIX: &str = "kv:";

/// Sled 存储配置
#[derive(Debug, Clone)]
pub struct SledStoreConfig {
    /// 数据库路径
    pub db_path: String,
}

impl Default for SledStoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/client.sled".to_string(),
        }
    }
}

/// Sled 键值存储
pub struct SledKeyValueStore {
    db: Db,
}

impl SledKeyValueStore {
    /// 打开（或创建）存储
    pub fn new(config: &SledStoreConfig) -> Result<Self, StoreError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %config.db_path,
            entries = db.scan_prefix(KEY_PREFIX).count(),
            "SledKeyValueStore initialized"
        );

        Ok(Self { db })
    }

    /// 打开现有存储
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let config = SledStoreConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

impl KeyValueStorePort for SledKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.db.get(Self::key(key)) {
            Ok(Some(data)) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| StoreError::SerializationError(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::DatabaseError(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db
            .insert(Self::key(key), value.as_bytes())
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.db
            .remove(Self::key(key))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
