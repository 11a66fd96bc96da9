//! /api/auth

use crate::application::ports::ApiError;
use crate::application::session::{TokenPair, UserProfile};
use crate::application::validation::{validate_email, validate_password, validate_required, validate_username};
use crate::infrastructure::http::client::{ApiClient, ApiRequest};
use crate::infrastructure::http::dto::{LoginRequest, RegisterRequest};

impl ApiClient {
    /// 登录（用户名或邮箱），成功后写入会话并拉取用户信息
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, ApiError> {
        validate_required("用户名", username)?;
        validate_required("密码", password)?;

        let request = ApiRequest::post("/api/auth/login")
            .anonymous()
            .json(&LoginRequest {
                username: username.trim().to_string(),
                password: password.to_string(),
            })?;
        let tokens: TokenPair = self.send_json(request).await?;
        self.session().login(tokens, None)?;

        let user = self.me().await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Logged in");
        Ok(user)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        let request = ApiRequest::post("/api/auth/register")
            .anonymous()
            .json(&RegisterRequest {
                username: username.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
            })?;
        let tokens: TokenPair = self.send_json(request).await?;
        self.session().login(tokens, None)?;

        let user = self.me().await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Registered");
        Ok(user)
    }

    /// 当前用户，同时刷新本地缓存的用户信息
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let user: UserProfile = self.send_json(ApiRequest::get("/api/auth/me")).await?;
        self.session().set_user(user.clone())?;
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().logout()?;
        Ok(())
    }
}
