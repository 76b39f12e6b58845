//! 社交预览（SMO）分析器：Open Graph / Twitter Card

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{Analyzer, ScanContext};
use crate::error::{AuditError, AuditResult};
use crate::extractor::{HtmlExtractor, PageDocument};
use crate::model::{ImageStatus, SocialPreviewResult, clamp_score};
use crate::net::HttpProbe;

const DEFAULT_TWITTER_CARD: &str = "summary_large_image";

#[derive(Debug, Clone)]
pub struct SocialPreviewAnalyzer {
    probe: HttpProbe,
}

impl SocialPreviewAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe }
    }

    pub async fn analyze(&self, url: &str, html: Option<&str>) -> AuditResult<SocialPreviewResult> {
        let page_url = Url::parse(url)?;
        let document = match html {
            Some(html) => HtmlExtractor::parse(html),
            None => {
                let page = self.probe.fetch_text(url, self.probe.config().probe_timeout()).await?;
                if page.status >= 400 {
                    return Err(AuditError::HttpStatus(page.status));
                }
                HtmlExtractor::parse(&page.body)
            }
        };

        let mut result = extract_preview(&document, &page_url);
        result.image_status = match result.twitter_image.as_deref().or(result.image.as_deref()) {
            Some(image) if self.image_reachable(image).await => ImageStatus::Valid,
            Some(_) => ImageStatus::Broken,
            None => ImageStatus::Missing,
        };
        result.score = calculate_score(&result);
        Ok(result)
    }

    /// HEAD <400 即可用，否则用只取 1KB 的 GET 再确认
    async fn image_reachable(&self, image_url: &str) -> bool {
        let timeout = self.probe.config().probe_timeout();
        match self.probe.head(image_url, timeout).await {
            Ok(resp) if resp.status < 400 => return true,
            Ok(resp) => debug!("HEAD {} returned {}", image_url, resp.status),
            Err(e) => debug!("HEAD {} failed: {}", image_url, e),
        }
        matches!(self.probe.ranged_get(image_url, timeout).await, Ok(status) if status < 400)
    }
}

#[async_trait]
impl Analyzer for SocialPreviewAnalyzer {
    type Output = SocialPreviewResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<SocialPreviewResult> {
        self.analyze(&ctx.url, ctx.html()).await
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn resolve(page_url: &Url, href: &str) -> String {
    page_url
        .join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// 字段回退链：OG → Twitter → <title>/description；图片状态与分数由调用方填充
pub fn extract_preview(doc: &PageDocument, page_url: &Url) -> SocialPreviewResult {
    let og_title = doc.meta_property_first("og:title");
    let og_description = doc.meta_property_first("og:description");
    let og_image = doc.meta_property_first("og:image").map(|i| resolve(page_url, i));
    let twitter_title = doc.meta_name_first("twitter:title");
    let twitter_description = doc.meta_name_first("twitter:description");
    let twitter_image = doc.meta_name_first("twitter:image").map(|i| resolve(page_url, i));

    let title = og_title.or(twitter_title).or(doc.title_text());
    let description = og_description
        .or(twitter_description)
        .or(doc.meta_name_first("description"));

    let mut missing_tags = Vec::new();
    if og_title.is_none() && twitter_title.is_none() {
        missing_tags.push("og:title".to_string());
    }
    if og_description.is_none() && twitter_description.is_none() {
        missing_tags.push("og:description".to_string());
    }
    if og_image.is_none() && twitter_image.is_none() {
        missing_tags.push("og:image".to_string());
    }

    SocialPreviewResult {
        title: owned(title),
        description: owned(description),
        url: Some(owned(doc.meta_property_first("og:url")).unwrap_or_else(|| page_url.to_string())),
        site_name: owned(doc.meta_property_first("og:site_name")),
        twitter_card: Some(doc.meta_name_first("twitter:card").unwrap_or(DEFAULT_TWITTER_CARD).to_string()),
        twitter_title: owned(twitter_title.or(title)),
        twitter_description: owned(twitter_description.or(description)),
        twitter_image: twitter_image.or_else(|| og_image.clone()),
        image: og_image,
        missing_tags,
        ..SocialPreviewResult::default()
    }
}

/// 无标题 -30，无描述 -20，无图或图片失效 -40
pub fn calculate_score(result: &SocialPreviewResult) -> u8 {
    let mut score: i64 = 100;
    if result.title.is_none() {
        score -= 30;
    }
    if result.description.is_none() {
        score -= 20;
    }
    if result.image.is_none() || result.image_status == ImageStatus::Broken {
        score -= 40;
    }
    clamp_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(html: &str) -> SocialPreviewResult {
        let page = Url::parse("https://shop.example/products/anvil").unwrap();
        extract_preview(&HtmlExtractor::parse(html), &page)
    }

    #[test]
    fn test_fallback_chain_and_relative_image() {
        let result = preview(
            r#"<head><title>Anvil | Shop</title>
            <meta name="description" content="Heavy duty">
            <meta name="og:image" content="/img/anvil.jpg">
            <meta property="twitter:title" content="Anvil for Twitter"></head>"#,
        );
        assert_eq!(result.title.as_deref(), Some("Anvil for Twitter"));
        assert_eq!(result.description.as_deref(), Some("Heavy duty"));
        assert_eq!(result.image.as_deref(), Some("https://shop.example/img/anvil.jpg"));
        assert_eq!(result.twitter_image, result.image);
        assert_eq!(result.twitter_card.as_deref(), Some(DEFAULT_TWITTER_CARD));
        assert_eq!(result.url.as_deref(), Some("https://shop.example/products/anvil"));
        assert_eq!(result.missing_tags, vec!["og:description"]);
    }

    #[test]
    fn test_empty_page_scores_ten() {
        let mut result = preview("<html></html>");
        result.image_status = ImageStatus::Missing;
        assert_eq!(result.missing_tags.len(), 3);
        assert_eq!(calculate_score(&result), 10);
    }

    #[test]
    fn test_broken_image_costs_forty() {
        let mut result = preview(
            r#"<meta property="og:title" content="T"><meta property="og:description" content="D">
            <meta property="og:image" content="https://cdn.example/x.png">"#,
        );
        result.image_status = ImageStatus::Broken;
        assert_eq!(calculate_score(&result), 60);
        result.image_status = ImageStatus::Valid;
        assert_eq!(calculate_score(&result), 100);
    }
}
