//! 全局错误类型定义

use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum AuditError {
    // 预检失败：目标不可达，整个扫描终止
    #[error("Target unreachable: {0}")]
    Unreachable(String),

    // 网络相关错误
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to fetch page: HTTP {0}")]
    HttpStatus(u16),
    #[error("External API error: {0}")]
    ExternalApi(String),
    #[error("Render failed: {0}")]
    Render(String),

    // DNS
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    // 序列化/反序列化错误
    #[error("JSON parse failed: {0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("Regex compile failed: {0}")]
    RegexCompileError(#[from] RegexError),
    #[error("URL parse failed: {0}")]
    UrlError(#[from] UrlParseError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Scanner not initialized")]
    ScannerNotInitialized,

    #[error("Async task failed: {0}")]
    AsyncTaskError(String),
}

impl AuditError {
    /// 请求是否因超时失败
    pub fn is_timeout(&self) -> bool {
        matches!(self, AuditError::Http(e) if e.is_timeout())
    }

    /// 请求是否因连接失败（拒绝连接/DNS解析失败等）
    pub fn is_connect(&self) -> bool {
        matches!(self, AuditError::Http(e) if e.is_connect())
    }
}

// 全局Result类型
pub type AuditResult<T> = Result<T, AuditError>;
