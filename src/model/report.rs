//! 扫描总结果模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Dimension, DimensionResult};
use super::{
    BrokenLinksResult, DnsHealthResult, GdprResult, GreenResult, SecurityResult, SeoResult,
    SocialPreviewResult, TechStackResult,
};

/// 扫描状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    #[default]
    Completed,
    Failed,
}

/// 对比模式胜者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Target,
    Competitor,
    Draw,
}

/// 单个维度的分析输出（成功值），用于扇入阶段按维度回填
#[derive(Debug, Clone)]
pub enum DimensionReport {
    Seo(SeoResult),
    Security(SecurityResult),
    TechStack(TechStackResult),
    BrokenLinks(BrokenLinksResult),
    Gdpr(GdprResult),
    SocialPreview(SocialPreviewResult),
    GreenIt(GreenResult),
    DnsHealth(DnsHealthResult),
}

macro_rules! impl_report_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for DimensionReport {
                fn from(result: $ty) -> Self {
                    DimensionReport::$variant(result)
                }
            }
        )*
    };
}

impl_report_from! {
    Seo => SeoResult,
    Security => SecurityResult,
    TechStack => TechStackResult,
    BrokenLinks => BrokenLinksResult,
    Gdpr => GdprResult,
    SocialPreview => SocialPreviewResult,
    GreenIt => GreenResult,
    DnsHealth => DnsHealthResult,
}

/// 一次扫描的完整结果
/// 每个维度始终存在；global_score 只能由聚合器写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub status: ScanStatus,
    pub(crate) global_score: u8,
    pub seo: SeoResult,
    pub security: SecurityResult,
    pub tech_stack: TechStackResult,
    pub broken_links: BrokenLinksResult,
    pub gdpr: GdprResult,
    pub social_preview: SocialPreviewResult,
    pub green_it: GreenResult,
    pub dns_health: DnsHealthResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor: Option<Box<AnalysisResult>>,
    pub versus_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    pub scan_duration_seconds: Option<f64>,
    pub errors: Vec<String>,
}

impl AnalysisResult {
    /// 新建结果，各维度为默认值
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp: Utc::now(),
            status: ScanStatus::Running,
            global_score: 0,
            seo: SeoResult::default(),
            security: SecurityResult::default(),
            tech_stack: TechStackResult::default(),
            broken_links: BrokenLinksResult::default(),
            gdpr: GdprResult::default(),
            social_preview: SocialPreviewResult::default(),
            green_it: GreenResult::default(),
            dns_health: DnsHealthResult::default(),
            competitor: None,
            versus_mode: false,
            winner: None,
            scan_duration_seconds: None,
            errors: Vec::new(),
        }
    }

    pub fn global_score(&self) -> u8 {
        self.global_score
    }

    /// 回填单个维度的成功结果
    pub fn apply(&mut self, report: DimensionReport) {
        match report {
            DimensionReport::Seo(r) => self.seo = r,
            DimensionReport::Security(r) => self.security = r,
            DimensionReport::TechStack(r) => self.tech_stack = r,
            DimensionReport::BrokenLinks(r) => self.broken_links = r,
            DimensionReport::Gdpr(r) => self.gdpr = r,
            DimensionReport::SocialPreview(r) => self.social_preview = r,
            DimensionReport::GreenIt(r) => self.green_it = r,
            DimensionReport::DnsHealth(r) => self.dns_health = r,
        }
    }

    /// 维度失败：替换为带错误的默认值，并追加到顶层 errors
    pub fn record_failure(&mut self, dimension: Dimension, error: impl Into<String>) {
        let error = error.into();
        self.errors
            .push(format!("{} analysis failed: {}", dimension.label(), error));
        match dimension {
            Dimension::Seo => self.seo = SeoResult::failed(error),
            Dimension::Security => self.security = SecurityResult::failed(error),
            Dimension::TechStack => self.tech_stack = TechStackResult::failed(error),
            Dimension::BrokenLinks => self.broken_links = BrokenLinksResult::failed(error),
            Dimension::Gdpr => self.gdpr = GdprResult::failed(error),
            Dimension::SocialPreview => self.social_preview = SocialPreviewResult::failed(error),
            Dimension::GreenIt => self.green_it = GreenResult::failed(error),
            Dimension::DnsHealth => self.dns_health = DnsHealthResult::failed(error),
        }
    }

    /// 指定维度当前的错误信息
    pub fn dimension_error(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Seo => self.seo.error(),
            Dimension::Security => self.security.error(),
            Dimension::TechStack => self.tech_stack.error(),
            Dimension::BrokenLinks => self.broken_links.error(),
            Dimension::Gdpr => self.gdpr.error(),
            Dimension::SocialPreview => self.social_preview.error(),
            Dimension::GreenIt => self.green_it.error(),
            Dimension::DnsHealth => self.dns_health.error(),
        }
    }
}
