//! 通用数据类型：严重等级、维度标识、维度结果特质

use serde::{Deserialize, Serialize};
use std::fmt;

/// 严重等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    Info,
    Ok,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Ok => "ok",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 八个分析维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Seo,
    Security,
    TechStack,
    BrokenLinks,
    Gdpr,
    SocialPreview,
    GreenIt,
    DnsHealth,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Seo,
        Dimension::Security,
        Dimension::TechStack,
        Dimension::BrokenLinks,
        Dimension::Gdpr,
        Dimension::SocialPreview,
        Dimension::GreenIt,
        Dimension::DnsHealth,
    ];

    /// 序列化字段名 / 进度事件 step 名
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Seo => "seo",
            Dimension::Security => "security",
            Dimension::TechStack => "tech_stack",
            Dimension::BrokenLinks => "broken_links",
            Dimension::Gdpr => "gdpr",
            Dimension::SocialPreview => "social_preview",
            Dimension::GreenIt => "green_it",
            Dimension::DnsHealth => "dns_health",
        }
    }

    /// 面向用户的错误前缀
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Seo => "SEO",
            Dimension::Security => "Security",
            Dimension::TechStack => "Tech stack",
            Dimension::BrokenLinks => "Broken links",
            Dimension::Gdpr => "GDPR",
            Dimension::SocialPreview => "SMO",
            Dimension::GreenIt => "Green IT",
            Dimension::DnsHealth => "DNS",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 单维度结果的公共行为
/// 分析失败时由编排器用默认值 + 错误信息替换，保证结果结构完整
pub trait DimensionResult: Default {
    const DIMENSION: Dimension;

    fn error(&self) -> Option<&str>;

    fn set_error(&mut self, error: String);

    /// 默认值实例，附带错误
    fn failed(error: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        let mut result = Self::default();
        result.set_error(error.into());
        result
    }
}

/// 为各维度结果实现 DimensionResult（均带 `error: Option<String>` 字段）
macro_rules! impl_dimension_result {
    ($ty:ty, $dim:expr) => {
        impl $crate::model::common::DimensionResult for $ty {
            const DIMENSION: $crate::model::common::Dimension = $dim;

            fn error(&self) -> Option<&str> {
                self.error.as_deref()
            }

            fn set_error(&mut self, error: String) {
                self.error = Some(error);
            }
        }
    };
}

pub(crate) use impl_dimension_result;

/// 分数统一截断到 [0,100]
pub fn clamp_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(-35), 0);
        assert_eq!(clamp_score(42), 42);
        assert_eq!(clamp_score(180), 100);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
