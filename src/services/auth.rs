use crate::core::config::Config;
use crate::core::error::{PortalError, Result};
use crate::core::io::{load_json, save_json, KeyValueStore};
use crate::core::state::StoredUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const CURRENT_USER_KEY: &str = "currentUser";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthTab {
    #[default]
    Login,
    Register,
}

impl AuthTab {
    pub fn form_id(self) -> &'static str {
        match self {
            AuthTab::Login => "loginForm",
            AuthTab::Register => "registerForm",
        }
    }

    pub fn tab_id(self) -> &'static str {
        match self {
            AuthTab::Login => "loginTab",
            AuthTab::Register => "registerTab",
        }
    }

    pub fn from_name(name: &str) -> Self {
        if name == "login" {
            AuthTab::Login
        } else {
            AuthTab::Register
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegisterRequest {
    pub identity: String,
    pub username: String,
    pub password: String,
    pub location: String,
    pub role: String,
}

/// Raw values of the registration form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub identity: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub manual_location: String,
    pub auto_location: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest> {
        if self.password != self.confirm_password {
            return Err(PortalError::InvalidInput("两次输入的密码不一致".to_string()));
        }

        let manual = self.manual_location.trim();
        let auto = self.auto_location.trim();
        let location = if !manual.is_empty() {
            manual
        } else if !auto.is_empty() {
            auto
        } else {
            return Err(PortalError::InvalidInput("请填写位置信息".to_string()));
        };

        Ok(RegisterRequest {
            identity: self.identity.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            location: location.to_string(),
            role: self.identity.clone(),
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub trait AuthBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> AuthBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait AuthBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> AuthBounds for T {}

/// The remote user API.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AuthApi: AuthBounds {
    async fn login(&self, username: &str, password: &str) -> Result<StoredUser>;
    async fn register(&self, request: &RegisterRequest) -> Result<()>;
    async fn logout(&self, username: &str) -> Result<()>;
    /// Current presence state of `username`, if the backend knows one.
    async fn state_search(&self, username: &str) -> Result<Option<String>>;
}

#[derive(Deserialize, Debug)]
struct ApiResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    users: Option<Vec<UserStatus>>,
}

#[derive(Deserialize, Debug)]
struct UserStatus {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LoginData {
    #[serde(default)]
    user: Option<StoredUser>,
}

#[derive(Deserialize, Debug)]
struct UsersData {
    #[serde(default)]
    users: Vec<UserStatus>,
}

impl ApiResponse {
    fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| PortalError::Network(format!("unexpected response: {} ({})", e, body)))
    }

    fn ok_or(self, default_message: &str) -> Result<Self> {
        match self.code {
            Some(200) => Ok(self),
            code => Err(PortalError::Api {
                code: code.unwrap_or_default(),
                message: self.error.unwrap_or_else(|| default_message.to_string()),
            }),
        }
    }

    fn login_user(self) -> Result<StoredUser> {
        let user = self
            .data
            .and_then(|d| serde_json::from_value::<LoginData>(d).ok())
            .and_then(|d| d.user);
        user.ok_or_else(|| PortalError::Api {
            code: 200,
            message: "登录成功，但未返回用户信息".to_string(),
        })
    }

    /// A bare `{users: [...]}` body carries no `code` and is accepted as is.
    fn state_or(self, default_message: &str) -> Result<Option<String>> {
        let resp = if self.users.is_some() {
            self
        } else {
            self.ok_or(default_message)?
        };
        Ok(resp.first_state())
    }

    /// `users` sits at the top level on older backends and under `data` on newer ones.
    fn first_state(self) -> Option<String> {
        let users = match self.users {
            Some(users) => users,
            None => self
                .data
                .and_then(|d| serde_json::from_value::<UsersData>(d).ok())
                .map(|d| d.users)
                .unwrap_or_default(),
        };
        users.into_iter().next().and_then(|u| u.state)
    }
}

pub struct HttpAuthClient {
    config: Config,
    client: reqwest::Client,
}

impl HttpAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<ApiResponse> {
        let url = self.config.endpoint(endpoint);
        log::debug!("POST {}", url);
        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            log::warn!("{} returned HTTP {}: {}", endpoint, status, text);
        }
        ApiResponse::parse(&text)
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct UsernameOnly<'a> {
    username: &'a str,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AuthApi for HttpAuthClient {
    async fn login(&self, username: &str, password: &str) -> Result<StoredUser> {
        self.post("user_login", &Credentials { username, password })
            .await?
            .ok_or("登录失败")?
            .login_user()
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.post("user_register", request).await?.ok_or("注册失败")?;
        Ok(())
    }

    async fn logout(&self, username: &str) -> Result<()> {
        self.post("user_logout", &UsernameOnly { username })
            .await?
            .ok_or("登出失败")?;
        Ok(())
    }

    async fn state_search(&self, username: &str) -> Result<Option<String>> {
        self.post("user_state_search", &UsernameOnly { username })
            .await?
            .state_or("查询失败")
    }
}

/// The signed-in user kept in the durable store, backed by the remote API.
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn AuthApi>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<dyn AuthApi>) -> Self {
        Self { store, api }
    }

    /// Stored user, or `None` when absent or corrupt (corrupt entries are dropped).
    pub fn current_user(&self) -> Option<StoredUser> {
        load_json(self.store.as_ref(), CURRENT_USER_KEY)
    }

    fn save_user(&self, user: &StoredUser) -> Result<()> {
        save_json(self.store.as_ref(), CURRENT_USER_KEY, user)?;
        Ok(())
    }

    /// Refreshes the stored user's presence state from the backend.
    pub async fn sync_state(&self) -> Result<Option<StoredUser>> {
        let Some(mut user) = self.current_user() else {
            return Ok(None);
        };
        if user.username.is_empty() {
            return Ok(Some(user));
        }

        if let Some(state) = self.api.state_search(&user.username).await? {
            user.state = Some(state);
            self.save_user(&user)?;
            log::debug!("Synced state for {}", user.username);
        }
        Ok(Some(user))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<StoredUser> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(PortalError::InvalidInput("请填写用户名和密码".to_string()));
        }

        let user = self.api.login(username, password).await?;
        self.save_user(&user)?;
        log::info!("Logged in as {}", user.username);
        Ok(user)
    }

    /// Registers, then signs the new account in.
    pub async fn register(&self, form: &RegistrationForm) -> Result<StoredUser> {
        let request = form.validate()?;
        self.api.register(&request).await?;
        log::info!("Registered {}", request.username);

        let user = self
            .api
            .login(&request.username, &request.password)
            .await
            .map_err(|e| {
                log::error!("Auto login after registration failed: {}", e);
                PortalError::AutoLogin(e.to_string())
            })?;
        self.save_user(&user)?;
        Ok(user)
    }

    /// Signs out locally even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        let user = self.current_user();
        let remote = match user.as_ref().filter(|u| !u.username.is_empty()) {
            Some(u) => self.api.logout(&u.username).await,
            None => Ok(()),
        };
        self.store.remove(CURRENT_USER_KEY)?;
        if let Err(e) = &remote {
            log::warn!("Logout call failed, signed out locally: {}", e);
        }
        remote
    }
}
