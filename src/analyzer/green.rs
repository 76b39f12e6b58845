//! Green IT 分析器：按页面总重量估算单次访问的 CO2 排放

use std::collections::HashSet;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;
use url::Url;

use super::{Analyzer, ScanContext};
use crate::error::{AuditError, AuditResult};
use crate::extractor::{HtmlExtractor, PageDocument};
use crate::model::GreenResult;
use crate::net::HttpProbe;

/// 每 MB 传输量对应的 CO2 克数
pub const CO2_GRAMS_PER_MB: f64 = 0.6;

/// (上界, 等级, 分数)，上界不含
const GRADES: &[(f64, &str, u8)] = &[
    (0.5, "A", 100),
    (1.0, "B", 85),
    (1.5, "C", 70),
    (2.0, "D", 55),
    (3.0, "E", 40),
    (5.0, "F", 25),
];

#[derive(Debug, Clone)]
pub struct GreenItAnalyzer {
    probe: HttpProbe,
}

impl GreenItAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe }
    }

    pub async fn analyze(&self, url: &str, html: Option<&str>) -> AuditResult<GreenResult> {
        let page_url = Url::parse(url)?;
        let (document, html_bytes) = match html {
            Some(html) => (HtmlExtractor::parse(html), html.len()),
            None => {
                let page = self.probe.fetch_text(url, self.probe.config().request_timeout()).await?;
                if page.status >= 400 {
                    return Err(AuditError::HttpStatus(page.status));
                }
                (HtmlExtractor::parse(&page.body), page.bytes)
            }
        };

        let resources = extract_resources(&document, &page_url);
        let timeout = self.probe.config().resource_timeout();
        let resource_bytes: u64 = stream::iter(resources.clone())
            .map(|resource| async move {
                self.probe.content_length(&resource, timeout).await.unwrap_or_else(|e| {
                    debug!("Size probe for {} failed: {}", resource, e);
                    0
                })
            })
            .buffer_unordered(self.probe.config().resource_concurrency)
            .fold(0u64, |acc, size| async move { acc + size })
            .await;

        Ok(build_result(html_bytes as u64 + resource_bytes, resources.len() + 1))
    }
}

#[async_trait]
impl Analyzer for GreenItAnalyzer {
    type Output = GreenResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<GreenResult> {
        self.analyze(&ctx.url, ctx.html()).await
    }
}

/// 图片、脚本、样式表、媒体源，解析为绝对地址后去重
pub fn extract_resources(doc: &PageDocument, page_url: &Url) -> Vec<String> {
    let images = doc.images.iter().filter_map(|img| img.src.as_deref());
    let candidates = images
        .chain(doc.script_srcs.iter().map(String::as_str))
        .chain(doc.stylesheets.iter().map(String::as_str))
        .chain(doc.media_srcs.iter().map(String::as_str));

    let mut seen = HashSet::new();
    candidates
        .map(str::trim)
        .filter(|src| !src.is_empty() && !src.starts_with("data:"))
        .filter_map(|src| page_url.join(src).ok())
        .map(|u| u.to_string())
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

pub fn build_result(total_bytes: u64, resource_count: usize) -> GreenResult {
    let total_mb = total_bytes as f64 / (1024.0 * 1024.0);
    let co2_grams = round3(total_mb * CO2_GRAMS_PER_MB);
    let (grade, score) = grade_for(co2_grams);

    GreenResult {
        co2_grams,
        grade: grade.to_string(),
        total_size_mb: round3(total_mb),
        resource_count,
        score,
        error: None,
    }
}

pub fn grade_for(co2_grams: f64) -> (&'static str, u8) {
    GRADES
        .iter()
        .find(|(upper, _, _)| co2_grams < *upper)
        .map(|(_, grade, score)| (*grade, *score))
        .unwrap_or(("G", 10))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade_for(0.0), ("A", 100));
        assert_eq!(grade_for(0.499), ("A", 100));
        assert_eq!(grade_for(0.5), ("B", 85));
        assert_eq!(grade_for(1.0), ("C", 70));
        assert_eq!(grade_for(2.999), ("E", 40));
        assert_eq!(grade_for(5.0), ("G", 10));
        assert_eq!(grade_for(42.0), ("G", 10));
    }

    #[test]
    fn test_build_result_from_bytes() {
        // 1 MB → 0.6 g → B
        let result = build_result(1024 * 1024, 4);
        assert_eq!(result.total_size_mb, 1.0);
        assert_eq!(result.co2_grams, 0.6);
        assert_eq!(result.grade, "B");
        assert_eq!(result.score, 85);
        assert_eq!(result.resource_count, 4);
    }

    #[test]
    fn test_extract_resources_dedupes() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/css/site.css">
            <link rel="icon" href="/favicon.ico">
            <script src="/js/app.js"></script>
            <script>inline()</script>
            </head><body>
            <img src="/img/a.png"><img src="/img/a.png"><img src="data:image/gif;base64,R0">
            <video><source src="https://cdn.example/v.mp4"></video>
            </body></html>"#;
        let page = Url::parse("https://example.com/").unwrap();
        let resources = extract_resources(&HtmlExtractor::parse(html), &page);
        assert_eq!(
            resources,
            vec![
                "https://example.com/img/a.png",
                "https://example.com/js/app.js",
                "https://example.com/css/site.css",
                "https://cdn.example/v.mp4",
            ]
        );
    }
}
