//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::DEFAULT_MAX_CONCURRENT;
use crate::infrastructure::ApiClientConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 后端接口配置
    #[serde(default)]
    pub api: ApiConfig,

    /// 章节批量生成配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 本地存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 后端接口配置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 后端基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 普通请求超时（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// 建立连接超时（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ApiClientConfig {
        ApiClientConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}

/// 章节批量生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 同时进行的章节生成请求数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// 本地存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 数据目录（令牌、用户信息、章节草稿）
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// sled 数据库路径
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("client.sled")
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
