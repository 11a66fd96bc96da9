//! HTTP API Client - 标书后端的 reqwest 客户端
//!
//! 每个请求携带 Bearer 令牌；收到 401 时最多刷新一次令牌并重放原请求，
//! 刷新失败或重放仍为 401 时清理本地凭据并发出一次 LoginRequired。

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::dto::RefreshRequest;
use super::error::{status_error, transport_error};
use crate::application::ports::{ApiError, StreamEvent};
use crate::application::session::{AuthSession, TokenPair};
use crate::infrastructure::stream::{decode_event_stream, LineDecoder};
use futures_util::stream::BoxStream;

/// API 客户端配置
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// 后端基础 URL
    pub base_url: String,
    /// 普通请求超时（秒），流式请求不受此限制
    pub timeout_secs: u64,
    /// 建立连接超时（秒）
    pub connect_timeout_secs: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// multipart 上传的单个文件，保留原始字节以便 401 后重建表单
#[derive(Debug, Clone)]
pub(crate) struct FileField {
    name: &'static str,
    file_name: String,
    mime: &'static str,
    bytes: Vec<u8>,
}

impl FileField {
    fn form(&self) -> Result<Form, ApiError> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(self.mime)
            .map_err(|e| ApiError::validation(format!("Invalid upload type {}: {}", self.mime, e)))?;
        Ok(Form::new().part(self.name, part))
    }
}

/// 一次可重放的请求描述
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    file: Option<FileField>,
    authenticated: bool,
    streaming: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            file: None,
            authenticated: true,
            streaming: false,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// 以 multipart/form-data 发送单个文件，与 json 互斥
    pub(crate) fn file(
        mut self,
        name: &'static str,
        file_name: impl Into<String>,
        mime: &'static str,
        bytes: Vec<u8>,
    ) -> Self {
        self.body = None;
        self.file = Some(FileField {
            name,
            file_name: file_name.into(),
            mime,
            bytes,
        });
        self
    }

    /// 不携带令牌，也不触发刷新（登录、注册、刷新本身）
    pub(crate) fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// 响应体按流读取，不设整体超时
    pub(crate) fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }
}

/// 标书后端 API 客户端
pub struct ApiClient {
    http: Client,
    stream_http: Client,
    config: ApiClientConfig,
    session: Arc<AuthSession>,
    /// 并发 401 时串行化刷新
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig, session: Arc<AuthSession>) -> Result<Self, ApiError> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let stream_http = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        tracing::info!(base_url = %config.base_url, "ApiClient initialized");

        Ok(Self {
            http,
            stream_http,
            config,
            session,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 发送一次请求，不处理 401
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let client = if request.streaming { &self.stream_http } else { &self.http };
        let mut builder = client.request(request.method.clone(), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(file) = &request.file {
            builder = builder.multipart(file.form()?);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            streaming = request.streaming,
            "Sending API request"
        );

        builder.send().await.map_err(transport_error)
    }

    /// 发送请求并处理鉴权，返回 2xx 响应
    pub(crate) async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        if !request.authenticated {
            let response = self.dispatch(request, None).await?;
            return Self::ensure_success(response).await;
        }

        let token = self.session.access_token().ok_or(ApiError::NotAuthenticated)?;
        let response = self.dispatch(request, Some(&token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::ensure_success(response).await;
        }

        tracing::info!(path = %request.path, "Access token rejected, refreshing");
        let fresh = self.refresh_after_unauthorized(&token).await?;

        let retry = self.dispatch(request, Some(&fresh)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            let err = Self::ensure_success(retry).await.err().unwrap_or(ApiError::Unauthorized(String::new()));
            tracing::warn!(path = %request.path, "Request still unauthorized after refresh");
            self.session.expire();
            return Err(err);
        }
        Self::ensure_success(retry).await
    }

    /// 401 之后取得新令牌
    ///
    /// 持锁期间若令牌已被其他请求换过，直接使用新令牌，不再刷新
    async fn refresh_after_unauthorized(&self, stale: &str) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        match self.session.access_token() {
            Some(current) if current != stale => return Ok(current),
            Some(_) => {}
            None => {
                self.session.expire();
                return Err(ApiError::Unauthorized("登录已失效".to_string()));
            }
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            self.session.expire();
            return Err(ApiError::Unauthorized("缺少刷新令牌".to_string()));
        };

        match self.request_refresh(refresh_token).await {
            Ok(tokens) => {
                let access = tokens.access_token.clone();
                self.session.update_tokens(tokens)?;
                tracing::info!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.session.expire();
                Err(match e {
                    ApiError::Unauthorized(message) => ApiError::Unauthorized(message),
                    other => ApiError::Unauthorized(other.to_string()),
                })
            }
        }
    }

    /// 刷新请求本身不走 send，避免递归
    async fn request_refresh(&self, refresh_token: String) -> Result<TokenPair, ApiError> {
        let request = ApiRequest::post("/api/auth/refresh")
            .anonymous()
            .json(&RefreshRequest { refresh_token })?;
        let response = self.dispatch(&request, None).await?;
        let response = Self::ensure_success(response).await?;
        Self::read_json(response).await
    }

    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = status_error(status, &body);
        tracing::debug!(status = status.as_u16(), error = %err, "API request failed");
        Err(err)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to decode response: {}", e)))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(&request).await?;
        Self::read_json(response).await
    }

    /// 忽略响应体（204 等）
    pub(crate) async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.send(&request).await?;
        Ok(())
    }

    pub(crate) async fn send_bytes(&self, request: ApiRequest) -> Result<Vec<u8>, ApiError> {
        let response = self.send(&request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    /// 打开事件流
    ///
    /// 鉴权与状态码在读流之前处理；之后的读取错误以流中的 Err 项出现
    pub(crate) async fn open_stream<D>(
        &self,
        request: ApiRequest,
        decoder: D,
    ) -> Result<BoxStream<'static, Result<StreamEvent<D::Output>, ApiError>>, ApiError>
    where
        D: LineDecoder + 'static,
        D::Output: 'static,
    {
        let response = self.send(&request.streaming()).await?;
        Ok(decode_event_stream(response.bytes_stream(), decoder))
    }
}
