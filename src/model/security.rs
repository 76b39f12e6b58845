//! 安全维度结果模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Dimension, Severity, impl_dimension_result};

/// 单个响应头的检查结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityHeaderFinding {
    pub name: String,
    pub present: bool,
    pub value: Option<String>,
    pub severity: Severity,
    pub recommendation: Option<String>,
    pub description: Option<String>,
}

/// TLS 证书信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SslInfo {
    pub valid: bool,
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_until_expiry: Option<i64>,
    pub is_expired: bool,
    pub is_expiring_soon: bool,
    pub protocol_version: Option<String>,
    pub cipher_suite: Option<String>,
    pub error: Option<String>,
}

/// 敏感文件暴露检查结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposedFileFinding {
    pub path: String,
    pub accessible: bool,
    pub severity: Severity,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityResult {
    pub score: u8,
    pub headers: Vec<SecurityHeaderFinding>,
    pub ssl: SslInfo,
    pub exposed_files: Vec<ExposedFileFinding>,
    pub error: Option<String>,
}

impl_dimension_result!(SecurityResult, Dimension::Security);
