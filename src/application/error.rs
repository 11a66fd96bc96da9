//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{ApiError, StoreError};
use crate::domain::OutlineError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 目录错误
    #[error("Outline error: {0}")]
    OutlineError(#[from] OutlineError),

    /// 本地存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(ApiError),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: &str) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

impl From<ApiError> for ApplicationError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(message) => Self::ValidationError(message),
            other => Self::ExternalServiceError(other),
        }
    }
}

impl From<StoreError> for ApplicationError {
    fn from(err: StoreError) -> Self {
        Self::StorageError(err.to_string())
    }
}
