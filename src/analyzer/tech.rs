//! 技术栈分析器
//! 配置了 Wappalyzer key 时优先走 API，任何失败都静默回退到本地签名匹配

use async_trait::async_trait;
use tracing::{debug, warn};

use super::wappalyzer::WappalyzerClient;
use super::{Analyzer, ScanContext};
use crate::error::AuditResult;
use crate::extractor::HtmlExtractor;
use crate::fingerprint::{DetectionInput, TechDetector, check_outdated};
use crate::model::{RawCookie, TechStackResult};
use crate::net::{HttpProbe, ResponseHeaders};

const JS_FRAMEWORK: &str = "JavaScript Framework";
const CSS_FRAMEWORK: &str = "CSS Framework";

#[derive(Debug, Clone)]
pub struct TechStackAnalyzer {
    probe: HttpProbe,
    detector: TechDetector,
    api: Option<WappalyzerClient>,
}

impl TechStackAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        let config = probe.config();
        let api = config
            .wappalyzer_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                WappalyzerClient::new(
                    probe.client().clone(),
                    config.wappalyzer_api_url.clone(),
                    key,
                    config.request_timeout(),
                )
            });

        Self {
            detector: TechDetector::new(),
            api,
            probe,
        }
    }

    /// 替换检测器（自定义签名表）
    pub fn with_detector(mut self, detector: TechDetector) -> Self {
        self.detector = detector;
        self
    }

    pub async fn analyze(
        &self,
        url: &str,
        html: Option<&str>,
        headers: Option<&ResponseHeaders>,
    ) -> AuditResult<TechStackResult> {
        if let Some(api) = &self.api {
            match api.lookup(url).await {
                Ok(mut result) => {
                    finalize(&mut result);
                    return Ok(result);
                }
                Err(e) => warn!("Wappalyzer API failed ({}), falling back to local detection", e),
            }
        }

        let mut result = match html {
            Some(html) => {
                let empty = ResponseHeaders::new();
                self.detect_local(html, headers.unwrap_or(&empty))
            }
            None => {
                let page = self.probe.fetch_text(url, self.probe.config().request_timeout()).await?;
                self.detect_local(&page.body, &page.headers)
            }
        };
        finalize(&mut result);
        debug!("Detected {} technologies on {}", result.technologies.len(), url);
        Ok(result)
    }

    /// 纯本地检测（不分类）
    pub fn detect_local(&self, html: &str, headers: &ResponseHeaders) -> TechStackResult {
        let document = HtmlExtractor::parse(html);
        let input = DetectionInput {
            html,
            headers,
            document: &document,
        };
        TechStackResult {
            technologies: self.detector.detect(&input),
            ..TechStackResult::default()
        }
    }
}

#[async_trait]
impl Analyzer for TechStackAnalyzer {
    type Output = TechStackResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<TechStackResult> {
        let headers = merge_observed_cookies(&ctx.headers, ctx.cookies().unwrap_or_default());
        self.analyze(&ctx.url, ctx.html(), Some(&headers)).await
    }
}

/// 渲染期间观察到的 Cookie 并入 cookie 头，签名表的 Cookie 规则据此匹配
pub fn merge_observed_cookies(headers: &ResponseHeaders, cookies: &[RawCookie]) -> ResponseHeaders {
    let mut merged = headers.clone();
    if !cookies.is_empty() {
        let pairs = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        merged.insert("cookie", pairs);
    }
    merged
}

fn finalize(result: &mut TechStackResult) {
    categorize(result);
    result.outdated_count = result
        .technologies
        .iter_mut()
        .map(check_outdated)
        .filter(|outdated| *outdated)
        .count();
}

/// 单值字段取第一个命中的技术；JS 框架优先于 CSS 框架；分析类有序去重
pub fn categorize(result: &mut TechStackResult) {
    let mut css_framework = None;

    for tech in &result.technologies {
        let name = || Some(tech.name.clone());

        if tech.has_category("CMS") && result.cms.is_none() {
            result.cms = name();
        }
        if tech.has_category(JS_FRAMEWORK) && result.framework.is_none() {
            result.framework = name();
        } else if tech.has_category(CSS_FRAMEWORK) && css_framework.is_none() {
            css_framework = name();
        }
        if tech.has_category("Web Server") && result.server.is_none() {
            result.server = name();
        }
        if tech.has_category("Programming Language") && result.programming_language.is_none() {
            result.programming_language = name();
        }
        if tech.has_category("CDN") && result.cdn.is_none() {
            result.cdn = name();
        }
        if (tech.has_category("Analytics") || tech.has_category("Tag Manager"))
            && !result.analytics.contains(&tech.name)
        {
            result.analytics.push(tech.name.clone());
        }
    }

    if result.framework.is_none() {
        result.framework = css_framework;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectedTechnology, Severity};

    fn tech(name: &str, categories: &[&str]) -> DetectedTechnology {
        let mut t = DetectedTechnology::new(name, 100);
        t.categories = categories.iter().map(|c| c.to_string()).collect();
        t
    }

    #[test]
    fn test_js_framework_beats_earlier_css_framework() {
        let mut result = TechStackResult {
            technologies: vec![
                tech("Bootstrap", &[CSS_FRAMEWORK]),
                tech("React", &[JS_FRAMEWORK]),
                tech("Vue.js", &[JS_FRAMEWORK]),
            ],
            ..TechStackResult::default()
        };
        categorize(&mut result);
        assert_eq!(result.framework.as_deref(), Some("React"));
    }

    #[test]
    fn test_first_cms_and_deduped_analytics() {
        let mut result = TechStackResult {
            technologies: vec![
                tech("WordPress", &["CMS", "Blogs"]),
                tech("Google Analytics", &["Analytics"]),
                tech("Drupal", &["CMS"]),
                tech("Google Tag Manager", &["Tag Manager"]),
                tech("Google Analytics", &["Analytics"]),
                tech("Nginx", &["Web Server", "Reverse Proxy"]),
                tech("Bulma", &[CSS_FRAMEWORK]),
            ],
            ..TechStackResult::default()
        };
        categorize(&mut result);
        assert_eq!(result.cms.as_deref(), Some("WordPress"));
        assert_eq!(result.server.as_deref(), Some("Nginx"));
        assert_eq!(result.framework.as_deref(), Some("Bulma"));
        assert_eq!(result.analytics, vec!["Google Analytics", "Google Tag Manager"]);
    }

    #[test]
    fn test_finalize_counts_outdated() {
        let mut old_jquery = tech("jQuery", &["JavaScript Library"]);
        old_jquery.version = Some("1.12.4".into());
        let mut result = TechStackResult {
            technologies: vec![old_jquery, tech("Nginx", &["Web Server"])],
            ..TechStackResult::default()
        };
        finalize(&mut result);
        assert_eq!(result.outdated_count, 1);
        assert_eq!(result.technologies[0].severity, Severity::High);
        assert!(result.technologies[1].latest_version.is_some());
        assert!(!result.technologies[1].is_outdated);
    }

    #[tokio::test]
    async fn test_local_detection_from_supplied_html() {
        let probe = HttpProbe::new(std::sync::Arc::new(crate::config::GlobalConfig::default())).unwrap();
        let analyzer = TechStackAnalyzer::new(probe);
        let html = r#"<html><head><meta name="generator" content="WordPress 5.8"></head>
            <body><link href="/wp-content/themes/x/style.css" rel="stylesheet"></body></html>"#;
        let headers = ResponseHeaders::new().with("Server", "nginx/1.18.0");

        let result = analyzer
            .analyze("https://blog.example", Some(html), Some(&headers))
            .await
            .unwrap();

        assert_eq!(result.cms.as_deref(), Some("WordPress"));
        assert_eq!(result.server.as_deref(), Some("Nginx"));
        assert!(result.outdated_count >= 1);
    }

    fn cookie(name: &str) -> RawCookie {
        RawCookie {
            name: name.to_string(),
            value: "1".to_string(),
            domain: None,
            path: None,
            expires: None,
            secure: true,
            http_only: false,
            same_site: None,
        }
    }

    #[tokio::test]
    async fn test_rendered_cookies_feed_cookie_rules() {
        let probe = HttpProbe::new(std::sync::Arc::new(crate::config::GlobalConfig::default())).unwrap();
        let analyzer = TechStackAnalyzer::new(probe);
        let ctx = ScanContext::new("https://blog.example", "en")
            .with_html("<html><body><p>plain page</p></body></html>")
            .with_cookies(vec![cookie("wp-settings-1"), cookie("PHPSESSID")]);

        let result = analyzer.run(&ctx).await.unwrap();

        assert_eq!(result.cms.as_deref(), Some("WordPress"));
        assert_eq!(result.programming_language.as_deref(), Some("PHP"));
    }

    #[test]
    fn test_merge_keeps_preflight_headers() {
        let headers = ResponseHeaders::new().with("Set-Cookie", "a=b; Path=/");
        let merged = merge_observed_cookies(&headers, &[cookie("_shopify_y")]);
        assert_eq!(merged.get_all("set-cookie").len(), 1);
        assert_eq!(merged.get("cookie"), Some("_shopify_y=1"));

        let untouched = merge_observed_cookies(&headers, &[]);
        assert!(!untouched.contains("cookie"));
    }
}
