//! 客户端输入校验
//!
//! 在发起请求之前检查，规则与后端 schema 保持一致

use crate::application::ports::ApiError;

pub const MIN_USERNAME_LEN: usize = 2;
pub const MAX_USERNAME_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_PROJECT_NAME_LEN: usize = 255;

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.trim().chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(ApiError::validation(format!(
            "用户名长度需在 {} 到 {} 个字符之间",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(ApiError::validation(format!(
            "密码长度需在 {} 到 {} 个字符之间",
            MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::validation("邮箱格式不正确")),
    }
}

pub fn validate_project_name(name: &str) -> Result<(), ApiError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_PROJECT_NAME_LEN {
        return Err(ApiError::validation("项目名称不能为空且不超过 255 个字符"));
    }
    Ok(())
}

pub fn validate_required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} 不能为空", field)));
    }
    Ok(())
}
