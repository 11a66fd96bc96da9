//! 认证会话
//!
//! 显式注入的会话对象，替代全局共享的 token/user 状态：
//! - login / restore: 初始化
//! - update_tokens: 刷新令牌（不动用户信息）
//! - logout / expire: 清理本地存储中的全部客户端状态

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::application::draft_cache::DRAFT_CACHE_KEY;
use crate::application::ports::{ClientEvent, EventSinkPort, KeyValueStorePort, StoreError};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

/// 访问令牌 + 刷新令牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
        }
    }
}

/// 当前用户信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default)]
struct SessionState {
    tokens: Option<TokenPair>,
    user: Option<UserProfile>,
}

/// 认证会话
pub struct AuthSession {
    store: Arc<dyn KeyValueStorePort>,
    events: Arc<dyn EventSinkPort>,
    state: RwLock<SessionState>,
    /// 本次登录周期内是否已发出 LoginRequired
    login_required_sent: AtomicBool,
}

impl AuthSession {
    /// 从本地存储恢复会话，缺失或损坏的数据视为未登录
    pub fn restore(store: Arc<dyn KeyValueStorePort>, events: Arc<dyn EventSinkPort>) -> Self {
        let read = |key: &str| match store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read session key");
                None
            }
        };

        let tokens = match (read(ACCESS_TOKEN_KEY), read(REFRESH_TOKEN_KEY)) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        };
        let user = read(USER_KEY).and_then(|raw| serde_json::from_str(&raw).ok());

        tracing::debug!(authenticated = tokens.is_some(), "Session restored");

        Self {
            store,
            events,
            state: RwLock::new(SessionState { tokens, user }),
            login_required_sent: AtomicBool::new(false),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 登录成功后写入令牌与用户信息
    pub fn login(&self, tokens: TokenPair, user: Option<UserProfile>) -> Result<(), StoreError> {
        self.persist_tokens(&tokens)?;
        if let Some(user) = &user {
            self.persist_user(user)?;
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.tokens = Some(tokens);
        state.user = user;
        self.login_required_sent.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// 更新用户信息（/auth/me 之后）
    pub fn set_user(&self, user: UserProfile) -> Result<(), StoreError> {
        self.persist_user(&user)?;
        self.state.write().unwrap_or_else(|e| e.into_inner()).user = Some(user);
        Ok(())
    }

    /// 刷新令牌后只替换令牌
    pub fn update_tokens(&self, tokens: TokenPair) -> Result<(), StoreError> {
        self.persist_tokens(&tokens)?;
        self.state.write().unwrap_or_else(|e| e.into_inner()).tokens = Some(tokens);
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_state(|s| s.tokens.as_ref().map(|t| t.access_token.clone()))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_state(|s| s.tokens.as_ref().map(|t| t.refresh_token.clone()))
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read_state(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state(|s| s.tokens.is_some())
    }

    /// 主动登出：清理全部本地客户端状态
    pub fn logout(&self) -> Result<(), StoreError> {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            *state = SessionState::default();
        }
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY, DRAFT_CACHE_KEY] {
            self.store.delete(key)?;
        }
        tracing::info!("Session cleared");
        Ok(())
    }

    /// 凭据无法恢复：清理状态并只发出一次 LoginRequired
    pub fn expire(&self) {
        if let Err(e) = self.logout() {
            tracing::error!(error = %e, "Failed to clear session storage");
        }
        if !self.login_required_sent.swap(true, Ordering::SeqCst) {
            tracing::warn!("Credentials expired, login required");
            self.events.publish(ClientEvent::LoginRequired);
        }
    }

    fn read_state<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&*state)
    }

    fn persist_tokens(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token)
    }

    fn persist_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(user).map_err(|e| StoreError::SerializationError(e.to_string()))?;
        self.store.set(USER_KEY, &raw)
    }
}
