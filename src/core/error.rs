use crate::core::form::Step;
use crate::services::geo::LocationError;
use thiserror::Error;

/// Failures surfaced to the page. None of them is fatal: the host shows a
/// message or takes the fallback path.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{step} has empty required fields: {}", fields.join(", "))]
    Validation { step: Step, fields: Vec<String> },

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: Step, to: Step },

    #[error("请先生成起诉状")]
    NoDocument,

    #[error("network error: {0}")]
    Network(String),

    #[error("{message}")]
    Api { code: i64, message: String },

    #[error("stored entry '{key}' is corrupt")]
    StorageCorrupt { key: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("注册成功，但自动登录失败: {0}")]
    AutoLogin(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        PortalError::Network(e.to_string())
    }
}

impl PortalError {
    /// Message suitable for a user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Validation { .. } => "请填写所有必填项".to_string(),
            PortalError::Network(_) => "网络请求失败".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;
