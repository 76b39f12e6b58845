//! 失效链接分析器
//! 站内链接 ≥400 即失效；站外链接只认 404/410，其余状态码视为可达但受限

use std::collections::HashSet;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;
use url::Url;

use super::{Analyzer, ScanContext};
use crate::error::{AuditError, AuditResult};
use crate::extractor::{HtmlExtractor, PageDocument};
use crate::model::{BrokenLink, BrokenLinksResult, LinkErrorType};
use crate::net::HttpProbe;

const ANCHOR_TEXT_LIMIT: usize = 100;
const IMAGE_ALT_LIMIT: usize = 50;
const SKIPPED_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:"];

/// 待检查的链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub url: String,
    pub source_text: Option<String>,
    pub is_internal: bool,
}

#[derive(Debug, Clone)]
pub struct BrokenLinksAnalyzer {
    probe: HttpProbe,
}

impl BrokenLinksAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe }
    }

    pub async fn analyze(&self, url: &str, html: Option<&str>) -> AuditResult<BrokenLinksResult> {
        let page_url = Url::parse(url)?;
        let document = match html {
            Some(html) => HtmlExtractor::parse(html),
            None => {
                let page = self.probe.fetch_text(url, self.probe.config().request_timeout()).await?;
                HtmlExtractor::parse(&page.body)
            }
        };

        let candidates = extract_links(&document, &page_url, self.probe.config().max_links);
        debug!("Checking {} links on {}", candidates.len(), url);

        let broken_links: Vec<BrokenLink> = stream::iter(candidates.clone())
            .map(|candidate| async move { self.check_link(&candidate).await })
            .buffered(self.probe.config().link_concurrency)
            .filter_map(|broken| async move { broken })
            .collect()
            .await;

        let internal_broken = broken_links.iter().filter(|l| l.is_internal).count();
        Ok(BrokenLinksResult {
            total_links_checked: candidates.len(),
            broken_count: broken_links.len(),
            internal_broken,
            external_broken: broken_links.len() - internal_broken,
            broken_links,
            error: None,
        })
    }

    /// 返回 None 表示链接正常
    async fn check_link(&self, candidate: &LinkCandidate) -> Option<BrokenLink> {
        let timeout = self.probe.config().probe_timeout();
        let (status_code, error_type) = match self.probe.head_then_get(&candidate.url, timeout).await {
            Ok(resp) if is_broken_status(resp.status, candidate.is_internal) => {
                (resp.status, LinkErrorType::HttpError)
            }
            Ok(_) => return None,
            Err(e) => (0, classify_error(&e)),
        };

        Some(BrokenLink {
            url: candidate.url.clone(),
            status_code,
            source_text: candidate.source_text.clone(),
            is_internal: candidate.is_internal,
            error_type,
        })
    }
}

#[async_trait]
impl Analyzer for BrokenLinksAnalyzer {
    type Output = BrokenLinksResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<BrokenLinksResult> {
        self.analyze(&ctx.url, ctx.html()).await
    }
}

pub fn is_broken_status(status: u16, is_internal: bool) -> bool {
    if is_internal {
        status >= 400
    } else {
        matches!(status, 404 | 410)
    }
}

fn classify_error(error: &AuditError) -> LinkErrorType {
    if error.is_timeout() {
        LinkErrorType::Timeout
    } else if error.is_connect() {
        LinkErrorType::ConnectionError
    } else {
        LinkErrorType::UnknownError
    }
}

/// 先锚点后图片，按出现顺序去重，截取前 `limit` 个
pub fn extract_links(document: &PageDocument, page_url: &Url, limit: usize) -> Vec<LinkCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let anchors = document.anchors.iter().filter_map(|a| {
        let href = a.href.trim();
        if href.is_empty() || SKIPPED_PREFIXES.iter().any(|p| starts_with_ignore_case(href, p)) {
            return None;
        }
        Some((href, truncate(a.text.trim(), ANCHOR_TEXT_LIMIT)))
    });

    let images = document.images.iter().filter_map(|img| {
        let src = img.src.as_deref()?.trim();
        if src.is_empty() || starts_with_ignore_case(src, "data:") {
            return None;
        }
        let alt = img.alt.as_deref().unwrap_or("no alt");
        Some((src, format!("[Image: {}]", truncate(alt, IMAGE_ALT_LIMIT))))
    });

    for (target, text) in anchors.chain(images) {
        if candidates.len() >= limit {
            break;
        }
        let Ok(resolved) = page_url.join(target) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }
        candidates.push(LinkCandidate {
            is_internal: same_authority(&resolved, page_url),
            source_text: (!text.is_empty()).then_some(text),
            url,
        });
    }

    candidates
}

fn same_authority(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, limit: usize) -> Vec<LinkCandidate> {
        let page = Url::parse("https://example.com/blog/").unwrap();
        extract_links(&HtmlExtractor::parse(html), &page, limit)
    }

    #[test]
    fn test_status_asymmetry() {
        assert!(is_broken_status(403, true));
        assert!(is_broken_status(500, true));
        assert!(!is_broken_status(403, false));
        assert!(!is_broken_status(503, false));
        assert!(is_broken_status(404, false));
        assert!(is_broken_status(410, false));
        assert!(!is_broken_status(301, true));
    }

    #[test]
    fn test_extract_filters_and_resolves() {
        let html = r##"
            <a href="#top">Top</a>
            <a href="javascript:void(0)">JS</a>
            <a href="MAILTO:me@example.com">Mail</a>
            <a href="tel:+33100000000">Call</a>
            <a href="">Empty</a>
            <a href="ftp://files.example.com/x">FTP</a>
            <a href="post-1">  First post  </a>
            <a href="https://other.org/page">Other</a>
            <img src="data:image/png;base64,AAAA">
            <img src="/img/logo.png" alt="Logo">
            <img src="/img/hero.png">
        "##;
        let links = extract(html, 50);
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/blog/post-1",
                "https://other.org/page",
                "https://example.com/img/logo.png",
                "https://example.com/img/hero.png",
            ]
        );
        assert_eq!(links[0].source_text.as_deref(), Some("First post"));
        assert!(links[0].is_internal);
        assert!(!links[1].is_internal);
        assert_eq!(links[2].source_text.as_deref(), Some("[Image: Logo]"));
        assert_eq!(links[3].source_text.as_deref(), Some("[Image: no alt]"));
    }

    #[test]
    fn test_extract_dedupes_then_caps() {
        let mut html = String::from(r#"<a href="/dup">a</a><a href="/dup">b</a>"#);
        for i in 0..60 {
            html.push_str(&format!(r#"<a href="/p{}">p</a>"#, i));
        }
        let links = extract(&html, 50);
        assert_eq!(links.len(), 50);
        assert_eq!(links[0].url, "https://example.com/dup");
        assert_eq!(links[1].url, "https://example.com/p0");
    }

    #[test]
    fn test_port_makes_link_external() {
        let links = extract(r#"<a href="https://example.com:8443/admin">Admin</a>"#, 50);
        assert!(!links[0].is_internal);
    }
}
