//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（bidwriter.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::application::DEFAULT_MAX_CONCURRENT;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["bidwriter", "bidwriter.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `BIDWRITER_`，层级分隔符 `__`）
/// 2. 配置文件（bidwriter.toml 或 bidwriter.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `BIDWRITER_API__BASE_URL=http://backend:8000`
/// - `BIDWRITER_GENERATION__MAX_CONCURRENT=3`
/// - `BIDWRITER_STORAGE__DATA_DIR=/var/lib/bidwriter`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("api.base_url", "http://localhost:8000")?
        .set_default("api.timeout_secs", 30)?
        .set_default("api.connect_timeout_secs", 10)?
        .set_default("generation.max_concurrent", DEFAULT_MAX_CONCURRENT as i64)?
        .set_default("storage.data_dir", "data")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("BIDWRITER")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "API base URL cannot be empty".to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "API base URL must start with http:// or https://: {}",
            base_url
        )));
    }

    if config.api.timeout_secs == 0 || config.api.connect_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "API timeouts cannot be 0".to_string(),
        ));
    }

    if config.generation.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Generation concurrency cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::debug!("=== Application Configuration ===");
    tracing::debug!("API Base URL: {}", config.api.base_url);
    tracing::debug!("API Timeout: {}s", config.api.timeout_secs);
    tracing::debug!("Max Concurrent Generations: {}", config.generation.max_concurrent);
    tracing::debug!("Data Directory: {:?}", config.storage.data_dir);
    tracing::debug!("Log Level: {}", config.log.level);
    tracing::debug!("=================================");
}
