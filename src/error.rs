//! 错误类型
//!
//! - [`WalletError`]: 核心引擎的结构化错误（kind + message），与传输层无关
//! - [`AppError`]: HTTP 适配层错误，负责映射到状态码和统一错误体

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// 核心错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// 字段、路径或模板格式错误（调用方可修正）
    #[error("validation error: {0}")]
    Validation(String),

    /// 助记词无效、不支持的币种、派生或签名失败（不可重试）
    #[error("crypto error: {0}")]
    Crypto(String),

    /// 注册时标识符冲突
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// 查找不存在的标识符
    #[error("not found: {0}")]
    NotFound(String),

    /// 底层存储 I/O 失败
    #[error("storage error: {0}")]
    Storage(String),
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Crypto,
    Duplicate,
    NotFound,
    Storage,
}

impl WalletError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Validation(_) => ErrorKind::Validation,
            WalletError::Crypto(_) => ErrorKind::Crypto,
            WalletError::Duplicate(_) => ErrorKind::Duplicate,
            WalletError::NotFound(_) => ErrorKind::NotFound,
            WalletError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WalletError::Validation(msg)
            | WalletError::Crypto(msg)
            | WalletError::Duplicate(msg)
            | WalletError::NotFound(msg)
            | WalletError::Storage(msg) => msg,
        }
    }

    /// 只有存储错误可以重试；写操作是否重试由调用方决定（覆盖风险）
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::Storage(_))
    }
}

impl From<sqlx::Error> for WalletError {
    fn from(err: sqlx::Error) -> Self {
        WalletError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Validation(err.to_string())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP 适配层错误
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    ValidationFailed,
    CryptoFailed,
    UserAlreadyExists,
    UserNotFound,
    StorageError,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::CryptoFailed => "crypto_failed",
            AppErrorCode::UserAlreadyExists => "user_already_exists",
            AppErrorCode::UserNotFound => "user_not_found",
            AppErrorCode::StorageError => "storage_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ValidationFailed,
            message: msg.into(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
            trace_id: None,
        }
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

/// 状态码映射：校验失败 422，密码学失败 417，重复 409，不存在 404，存储 500
///
/// 每种错误对应唯一状态码。
impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        let (code, status) = match err.kind() {
            ErrorKind::Validation => (
                AppErrorCode::ValidationFailed,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            ErrorKind::Crypto => (AppErrorCode::CryptoFailed, StatusCode::EXPECTATION_FAILED),
            ErrorKind::Duplicate => (AppErrorCode::UserAlreadyExists, StatusCode::CONFLICT),
            ErrorKind::NotFound => (AppErrorCode::UserNotFound, StatusCode::NOT_FOUND),
            ErrorKind::Storage => (
                AppErrorCode::StorageError,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        };
        Self {
            code,
            message: err.to_string(),
            status,
            trace_id: None,
        }
    }
}
