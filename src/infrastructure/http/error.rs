//! HTTP Error Mapping - reqwest 错误与后端错误体到 ApiError 的转换

use reqwest::StatusCode;

use crate::application::ports::ApiError;

/// 传输层错误
pub(crate) fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::Network(format!("Cannot connect to backend: {}", e))
    } else {
        ApiError::Network(e.to_string())
    }
}

/// 从错误响应体中取出可读信息
///
/// 后端错误体为 `{"detail": "..."}`，校验失败时 `detail` 是 `[{"msg": ...}]` 数组
pub(crate) fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

/// 非 2xx 状态码
pub(crate) fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = error_detail(body);
    if status == StatusCode::UNAUTHORIZED {
        ApiError::Unauthorized(message)
    } else {
        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }
}
