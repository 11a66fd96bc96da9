//! Local Store Port - 本地持久化键值存储
//!
//! 凭据、用户信息、章节草稿都以固定 key 存放。
//! 具体实现使用 Sled（持久化）或 DashMap（内存，测试用）。

use thiserror::Error;

/// 本地存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Key-Value Store Port
///
/// 只处理字符串 key / 字符串 value，值的编码由调用方负责
pub trait KeyValueStorePort: Send + Sync {
    /// 读取 key 对应的值
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// 写入（覆盖）key 对应的值
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// 删除 key，不存在时不报错
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
