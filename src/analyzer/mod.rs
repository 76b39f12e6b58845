//! 八个维度的分析器
//! 每个分析器既提供按自身契约调用的 `analyze`，也实现统一的 `Analyzer::run` 供编排器扇出

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditResult;
use crate::model::{DimensionReport, DimensionResult, RawCookie};
use crate::net::ResponseHeaders;

pub mod dns;
pub mod gdpr;
pub mod green;
pub mod links;
pub mod security;
pub mod seo;
pub mod social;
pub mod tech;
pub mod wappalyzer;

pub use self::dns::DnsHealthAnalyzer;
pub use self::gdpr::GdprAnalyzer;
pub use self::green::GreenItAnalyzer;
pub use self::links::BrokenLinksAnalyzer;
pub use self::security::SecurityAnalyzer;
pub use self::seo::SeoAnalyzer;
pub use self::social::SocialPreviewAnalyzer;
pub use self::tech::TechStackAnalyzer;
pub use self::wappalyzer::WappalyzerClient;

/// 扇出时分发给所有分析器的只读快照
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    pub url: String,
    pub language: String,
    /// 渲染器产出的 HTML，None 表示各分析器自行抓取
    pub html: Option<Arc<str>>,
    /// 渲染期间观察到的 Cookie，None 表示未渲染
    pub cookies: Option<Arc<Vec<RawCookie>>>,
    /// 预检得到的响应头
    pub headers: Arc<ResponseHeaders>,
}

impl ScanContext {
    pub fn new(url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            language: language.into(),
            ..Self::default()
        }
    }

    pub fn with_html(mut self, html: impl Into<Arc<str>>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_cookies(mut self, cookies: Vec<RawCookie>) -> Self {
        self.cookies = Some(Arc::new(cookies));
        self
    }

    pub fn with_headers(mut self, headers: ResponseHeaders) -> Self {
        self.headers = Arc::new(headers);
        self
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn cookies(&self) -> Option<&[RawCookie]> {
        self.cookies.as_deref().map(Vec::as_slice)
    }
}

/// 维度分析器
/// 返回 Err 表示整个维度失败，由编排器替换为带错误的默认结果
#[async_trait]
pub trait Analyzer: Send + Sync + 'static {
    type Output: DimensionResult + Into<DimensionReport> + Send + 'static;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<Self::Output>;
}
