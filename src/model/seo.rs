//! SEO / 性能维度结果模型

use serde::{Deserialize, Serialize};

use super::common::{Dimension, impl_dimension_result};

/// 四个 Lighthouse 分类分数，None 表示不可用（不同于 0 分）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LighthouseScores {
    pub performance: Option<u8>,
    pub seo: Option<u8>,
    pub accessibility: Option<u8>,
    pub best_practices: Option<u8>,
}

/// Core Web Vitals
/// lcp / fcp 单位秒，fid / inp / ttfb 单位毫秒，cls 无量纲
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreWebVitals {
    pub lcp: Option<f64>,
    pub lcp_score: Option<String>,
    pub fid: Option<f64>,
    pub fid_score: Option<String>,
    pub cls: Option<f64>,
    pub cls_score: Option<String>,
    pub fcp: Option<f64>,
    pub ttfb: Option<f64>,
    pub inp: Option<f64>,
}

/// 审计项 / 优化建议 / 诊断
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub display_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoResult {
    pub scores: LighthouseScores,
    pub core_web_vitals: CoreWebVitals,
    pub audits: Vec<AuditItem>,
    pub opportunities: Vec<AuditItem>,
    pub diagnostics: Vec<AuditItem>,
    pub error: Option<String>,
}

impl_dimension_result!(SeoResult, Dimension::Seo);
