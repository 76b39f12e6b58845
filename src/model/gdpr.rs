//! 隐私合规维度结果模型

use serde::{Deserialize, Serialize};

use super::common::{Dimension, Severity, impl_dimension_result};

/// Cookie 分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieCategory {
    Essential,
    Analytics,
    Marketing,
    #[default]
    Unknown,
}

impl CookieCategory {
    pub fn is_essential(&self) -> bool {
        matches!(self, CookieCategory::Essential)
    }
}

/// 页面加载期间观察到的原始 Cookie（渲染器或 Set-Cookie 头）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// Unix 时间戳（秒），会话 Cookie 为 None
    pub expires: Option<f64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieItem {
    pub name: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
    pub expires: Option<f64>,
    pub is_session: bool,
    pub same_site: Option<String>,
    pub is_compliant: bool,
    pub category: CookieCategory,
    pub risk_level: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdprResult {
    pub compliant: bool,
    pub cookies: Vec<CookieItem>,
    pub violation_count: usize,
    pub cmp_detected: Option<String>,
    pub privacy_policy_detected: bool,
    pub privacy_policy_url: Option<String>,
    pub score: u8,
    pub error: Option<String>,
}

impl_dimension_result!(GdprResult, Dimension::Gdpr);
