//! SEO / 性能分析器
//! 优先调用 PageSpeed Insights；API 不可用时基于 HTML 做本地启发式估算

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Analyzer, ScanContext};
use crate::error::{AuditError, AuditResult};
use crate::extractor::{HtmlExtractor, PageDocument};
use crate::model::{AuditItem, CoreWebVitals, LighthouseScores, SeoResult};
use crate::net::HttpProbe;

const CATEGORIES: &[&str] = &["performance", "seo", "accessibility", "best-practices"];

const KEY_AUDITS: &[&str] = &[
    "meta-description",
    "document-title",
    "viewport",
    "robots-txt",
    "canonical",
    "hreflang",
    "structured-data",
    "http-status-code",
    "is-crawlable",
    "link-text",
    "image-alt",
    "heading-order",
];

const OPPORTUNITY_AUDITS: &[&str] = &[
    "render-blocking-resources",
    "unused-css-rules",
    "unused-javascript",
    "modern-image-formats",
    "uses-optimized-images",
    "uses-responsive-images",
    "efficient-animated-content",
    "preload-lcp-image",
    "total-byte-weight",
    "uses-text-compression",
    "uses-rel-preconnect",
];

const DIAGNOSTIC_AUDITS: &[&str] = &[
    "dom-size",
    "critical-request-chains",
    "largest-contentful-paint-element",
    "layout-shift-elements",
    "long-tasks",
    "main-thread-work-breakdown",
    "bootup-time",
    "font-display",
    "third-party-summary",
];

const MAX_OPPORTUNITIES: usize = 10;
const FALLBACK_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct SeoAnalyzer {
    probe: HttpProbe,
}

impl SeoAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe }
    }

    pub async fn analyze(&self, url: &str, language: &str, html: Option<&str>) -> AuditResult<SeoResult> {
        match self.query_pagespeed(url, language).await {
            Ok(result) => return Ok(result),
            Err(e) => warn!("PageSpeed API unavailable for {}: {}", url, e),
        }

        let html = match html {
            Some(html) => Some(html.to_string()),
            None => self.fetch_fallback_html(url).await,
        };

        match html {
            Some(html) => {
                info!("Running local SEO analysis for {}", url);
                Ok(local_analyze(&html))
            }
            None => Err(AuditError::ExternalApi(
                "PageSpeed API failed and all local fetch attempts failed.".to_string(),
            )),
        }
    }

    async fn query_pagespeed(&self, url: &str, language: &str) -> AuditResult<SeoResult> {
        let config = self.probe.config();
        let mut params: Vec<(&str, &str)> = vec![("url", url), ("strategy", "mobile")];
        params.extend(CATEGORIES.iter().map(|c| ("category", *c)));
        params.push(("locale", language));
        match config.pagespeed_api_key.as_deref() {
            Some(key) if config.has_pagespeed_key() => params.push(("key", key)),
            _ => debug!("No PageSpeed API key, using anonymous mode"),
        }

        let resp = self
            .probe
            .client()
            .get(&config.pagespeed_api_url)
            .query(&params)
            .timeout(config.pagespeed_timeout())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuditError::ExternalApi(format!(
                "PageSpeed returned status {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let data: Value = serde_json::from_str(&resp.text().await?)?;
        Ok(parse_pagespeed(&data))
    }

    /// 仅接受 200 响应
    async fn fetch_fallback_html(&self, url: &str) -> Option<String> {
        match self.probe.fetch_text(url, FALLBACK_FETCH_TIMEOUT).await {
            Ok(page) if page.status == 200 => Some(page.body),
            Ok(page) => {
                warn!("Fallback fetch of {} returned status {}", url, page.status);
                None
            }
            Err(e) => {
                warn!("Fallback fetch of {} failed: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl Analyzer for SeoAnalyzer {
    type Output = SeoResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<SeoResult> {
        self.analyze(&ctx.url, &ctx.language, ctx.html()).await
    }
}

/// 解析 PageSpeed v5 响应
pub fn parse_pagespeed(data: &Value) -> SeoResult {
    let lighthouse = &data["lighthouseResult"];
    let categories = &lighthouse["categories"];
    let audits = &lighthouse["audits"];

    let scores = LighthouseScores {
        performance: category_score(&categories["performance"]),
        seo: category_score(&categories["seo"]),
        accessibility: category_score(&categories["accessibility"]),
        best_practices: category_score(&categories["best-practices"]),
    };
    debug!("PageSpeed scores: {:?}", scores);

    SeoResult {
        scores,
        core_web_vitals: extract_core_web_vitals(audits, &data["loadingExperience"]["metrics"]),
        audits: extract_key_audits(audits),
        opportunities: extract_opportunities(audits),
        diagnostics: extract_diagnostics(audits),
        error: None,
    }
}

/// 0–1 → 0–100，小数部分截断
fn category_score(category: &Value) -> Option<u8> {
    category["score"]
        .as_f64()
        .map(|score| (score * 100.0).trunc().clamp(0.0, 100.0) as u8)
}

/// 优先取真实用户数据（loadingExperience），否则取实验室审计值
fn extract_core_web_vitals(audits: &Value, field: &Value) -> CoreWebVitals {
    let mut vitals = CoreWebVitals::default();
    let lab = |id: &str| audits[id]["numericValue"].as_f64();

    let lcp = &field["LARGEST_CONTENTFUL_PAINT_MS"];
    if is_present(lcp) {
        vitals.lcp = Some(percentile(lcp) / 1000.0);
        vitals.lcp_score = Some(field_category(lcp));
    } else if let Some(ms) = lab("largest-contentful-paint") {
        let secs = ms / 1000.0;
        vitals.lcp = Some(secs);
        vitals.lcp_score = Some(metric_rating(secs, 2.5, 4.0).to_string());
    }

    let fid = &field["FIRST_INPUT_DELAY_MS"];
    if is_present(fid) {
        vitals.fid = Some(percentile(fid));
        vitals.fid_score = Some(field_category(fid));
    }

    let inp = &field["INTERACTION_TO_NEXT_PAINT"];
    vitals.inp = if is_present(inp) {
        Some(percentile(inp))
    } else {
        lab("experimental-interaction-to-next-paint")
    };

    let cls = &field["CUMULATIVE_LAYOUT_SHIFT_SCORE"];
    if is_present(cls) {
        vitals.cls = Some(percentile(cls) / 100.0);
        vitals.cls_score = Some(field_category(cls));
    } else if let Some(value) = lab("cumulative-layout-shift") {
        vitals.cls = Some(value);
        vitals.cls_score = Some(metric_rating(value, 0.1, 0.25).to_string());
    }

    vitals.fcp = lab("first-contentful-paint").map(|ms| ms / 1000.0);
    vitals.ttfb = lab("server-response-time");
    vitals
}

fn is_present(metric: &Value) -> bool {
    metric.as_object().is_some_and(|m| !m.is_empty())
}

fn percentile(metric: &Value) -> f64 {
    metric["percentile"].as_f64().unwrap_or(0.0)
}

/// FAST / AVERAGE / SLOW → fast / average / slow，下划线转连字符
fn field_category(metric: &Value) -> String {
    metric["category"]
        .as_str()
        .unwrap_or_default()
        .to_lowercase()
        .replace('_', "-")
}

/// 阈值闭区间：≤good 为 good，≤poor 为 needs-improvement
pub fn metric_rating(value: f64, good: f64, poor: f64) -> &'static str {
    if value <= good {
        "good"
    } else if value <= poor {
        "needs-improvement"
    } else {
        "poor"
    }
}

fn audit_item(id: &str, audit: &Value) -> AuditItem {
    AuditItem {
        id: id.to_string(),
        title: audit["title"].as_str().unwrap_or_default().to_string(),
        description: audit["description"].as_str().map(str::to_string),
        score: audit["score"].as_f64(),
        display_value: audit["displayValue"].as_str().map(str::to_string),
        passed: None,
        savings_ms: None,
    }
}

fn present_audits<'a>(audits: &'a Value, ids: &'a [&'a str]) -> impl Iterator<Item = (&'a str, &'a Value)> {
    ids.iter()
        .filter_map(move |id| audits.get(*id).map(|audit| (*id, audit)))
}

fn extract_key_audits(audits: &Value) -> Vec<AuditItem> {
    present_audits(audits, KEY_AUDITS)
        .map(|(id, audit)| {
            let mut item = audit_item(id, audit);
            item.passed = Some(item.score == Some(1.0));
            item
        })
        .collect()
}

/// 只保留有改进空间的项，最差的在前，最多 10 条
fn extract_opportunities(audits: &Value) -> Vec<AuditItem> {
    let mut items: Vec<AuditItem> = present_audits(audits, OPPORTUNITY_AUDITS)
        .filter(|(_, audit)| audit["score"].as_f64().is_some_and(|s| s < 1.0))
        .map(|(id, audit)| {
            let mut item = audit_item(id, audit);
            item.savings_ms = audit["numericValue"].as_f64();
            item
        })
        .collect();

    items.sort_by(|a, b| a.score.unwrap_or(1.0).total_cmp(&b.score.unwrap_or(1.0)));
    items.truncate(MAX_OPPORTUNITIES);
    items
}

fn extract_diagnostics(audits: &Value) -> Vec<AuditItem> {
    present_audits(audits, DIAGNOSTIC_AUDITS)
        .map(|(id, audit)| audit_item(id, audit))
        .collect()
}

fn local_audit(id: &str, title: &str, passed: bool, display_value: Option<String>) -> AuditItem {
    AuditItem {
        id: id.to_string(),
        title: title.to_string(),
        passed: Some(passed),
        display_value,
        ..AuditItem::default()
    }
}

/// 本地启发式评分
pub fn local_analyze(html: &str) -> SeoResult {
    let doc = HtmlExtractor::parse(html);
    let (seo, audits) = local_seo_score(&doc);

    SeoResult {
        scores: LighthouseScores {
            performance: Some(local_performance_score(html.len(), &doc)),
            seo: Some(seo),
            accessibility: Some(0),
            best_practices: Some(0),
        },
        audits,
        diagnostics: vec![AuditItem {
            id: "local-fallback".to_string(),
            title: "Local Analysis Mode".to_string(),
            description: Some(
                "Google PageSpeed API was unreachable. Results are estimated locally from Deep Scan data.".to_string(),
            ),
            score: Some(0.5),
            ..AuditItem::default()
        }],
        ..SeoResult::default()
    }
}

/// 五项各 20 分；H1 多于一个记 10 分
fn local_seo_score(doc: &PageDocument) -> (u8, Vec<AuditItem>) {
    let mut score = 0u8;
    let mut audits = Vec::with_capacity(5);

    let title = doc.title_text();
    if title.is_some() {
        score += 20;
    }
    audits.push(local_audit(
        "document-title",
        "Document has a title",
        title.is_some(),
        Some(title.unwrap_or("Missing").to_string()),
    ));

    let description = doc.meta_name_first("description");
    if description.is_some() {
        score += 20;
    }
    audits.push(local_audit(
        "meta-description",
        "Document has a meta description",
        description.is_some(),
        Some(match description {
            Some(d) => format!("{}...", d.chars().take(50).collect::<String>()),
            None => "Missing".to_string(),
        }),
    ));

    score += match doc.h1_count {
        1 => 20,
        0 => 0,
        _ => 10,
    };
    audits.push(local_audit(
        "heading-order",
        "Heading structure",
        doc.h1_count == 1,
        Some(format!("Found {} H1 tags", doc.h1_count)),
    ));

    let missing_alt = doc.images_missing_alt();
    let alts_ok = !doc.images.is_empty() && missing_alt == 0;
    if alts_ok {
        score += 20;
    }
    audits.push(local_audit(
        "image-alt",
        "Images have alt attributes",
        alts_ok,
        Some(format!("{} images missing alt text", missing_alt)),
    ));

    let viewport = doc.meta_name_first("viewport").is_some();
    if viewport {
        score += 20;
    }
    audits.push(local_audit("viewport", "Has viewport meta tag", viewport, None));

    (score, audits)
}

/// 100 起扣，结果限制在 [30, 95]
fn local_performance_score(html_bytes: usize, doc: &PageDocument) -> u8 {
    let mut score: i64 = 100;
    let size_kb = html_bytes as f64 / 1024.0;
    if size_kb > 200.0 {
        score -= 10;
    }
    if size_kb > 1000.0 {
        score -= 20;
    }
    if doc.script_count > 20 {
        score -= 10;
    }
    if doc.script_count > 50 {
        score -= 15;
    }
    if doc.images_without_lazy() > 5 {
        score -= 5;
    }
    score.clamp(30, 95) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_seo_full_marks() {
        let html = r#"<html><head><title>Acme</title>
            <meta name="description" content="We make anvils">
            <meta name="viewport" content="width=device-width"></head>
            <body><h1>Acme</h1><img src="a.png" alt="anvil"></body></html>"#;
        let result = local_analyze(html);
        assert_eq!(result.scores.seo, Some(100));
        assert_eq!(result.scores.performance, Some(95));
        assert_eq!(result.scores.accessibility, Some(0));
        assert_eq!(result.diagnostics[0].id, "local-fallback");
        assert!(result.audits.iter().all(|a| a.passed == Some(true)));
    }

    #[test]
    fn test_local_seo_partial_credit() {
        // 两个 H1 得 10 分；无图片时 alt 检查不通过
        let html = "<html><body><h1>a</h1><h1>b</h1></body></html>";
        let result = local_analyze(html);
        assert_eq!(result.scores.seo, Some(10));
    }

    #[test]
    fn test_local_performance_floor() {
        let mut html = String::from("<html><body>");
        for _ in 0..60 {
            html.push_str("<script>var x = 1;</script>");
        }
        for _ in 0..6 {
            html.push_str(r#"<img src="x.png" alt="x">"#);
        }
        html.push_str(&"a".repeat(1_100 * 1024));
        let result = local_analyze(&html);
        // 100 - 10 - 20 - 10 - 15 - 5 = 40
        assert_eq!(result.scores.performance, Some(40));
    }

    #[test]
    fn test_metric_rating_thresholds() {
        assert_eq!(metric_rating(2.5, 2.5, 4.0), "good");
        assert_eq!(metric_rating(4.0, 2.5, 4.0), "needs-improvement");
        assert_eq!(metric_rating(0.26, 0.1, 0.25), "poor");
    }

    #[test]
    fn test_parse_pagespeed_payload() {
        let data = json!({
            "loadingExperience": {"metrics": {
                "LARGEST_CONTENTFUL_PAINT_MS": {"percentile": 3100, "category": "AVERAGE"}
            }},
            "lighthouseResult": {
                "categories": {
                    "performance": {"score": 0.87},
                    "seo": {"score": 1.0},
                    "accessibility": {"score": null},
                    "best-practices": {"score": 0.5}
                },
                "audits": {
                    "cumulative-layout-shift": {"numericValue": 0.3},
                    "first-contentful-paint": {"numericValue": 1200.0},
                    "document-title": {"title": "Has title", "score": 1},
                    "canonical": {"title": "Canonical", "score": 0},
                    "unused-javascript": {"title": "Unused JS", "score": 0.4, "numericValue": 900.0},
                    "render-blocking-resources": {"title": "Blocking", "score": 0.1},
                    "uses-text-compression": {"title": "Compression", "score": 1},
                    "dom-size": {"title": "DOM size", "score": 0.9, "displayValue": "1,200 elements"}
                }
            }
        });
        let result = parse_pagespeed(&data);

        assert_eq!(result.scores.performance, Some(87));
        assert_eq!(result.scores.seo, Some(100));
        assert_eq!(result.scores.accessibility, None);
        assert_eq!(result.scores.best_practices, Some(50));

        let vitals = &result.core_web_vitals;
        assert_eq!(vitals.lcp, Some(3.1));
        assert_eq!(vitals.lcp_score.as_deref(), Some("average"));
        assert_eq!(vitals.cls_score.as_deref(), Some("poor"));
        assert_eq!(vitals.fcp, Some(1.2));

        let ids: Vec<&str> = result.audits.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["document-title", "canonical"]);
        assert_eq!(result.audits[0].passed, Some(true));
        assert_eq!(result.audits[1].passed, Some(false));

        let opportunities: Vec<&str> = result.opportunities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(opportunities, vec!["render-blocking-resources", "unused-javascript"]);
        assert_eq!(result.opportunities[1].savings_ms, Some(900.0));
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_category_score_truncates() {
        // 0.29 * 100 = 28.999...，按截断取 28
        assert_eq!(category_score(&json!({"score": 0.29})), Some(28));
        assert_eq!(category_score(&json!({"score": 0.999})), Some(99));
        assert_eq!(category_score(&json!({"score": 1})), Some(100));
        assert_eq!(category_score(&json!({"score": null})), None);
    }
}
