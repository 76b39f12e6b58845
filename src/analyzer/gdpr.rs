//! 隐私 / Cookie 合规分析器

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{Analyzer, ScanContext};
use crate::error::AuditResult;
use crate::extractor::{HtmlExtractor, PageDocument};
use crate::model::{CookieCategory, CookieItem, GdprResult, RawCookie, Severity, clamp_score};
use crate::net::HttpProbe;

const ANALYTICS_PREFIXES: &[&str] = &["_ga", "_gid", "_gat", "_hj", "_pk_", "amplitude", "mp_", "ajs_"];
const MARKETING_PREFIXES: &[&str] = &["_fbp", "_gcl", "_ttp", "li_", "_uet"];
const MARKETING_NAMES: &[&str] = &["fr", "ide", "test_cookie", "muid"];
const ESSENTIAL_PREFIXES: &[&str] = &["__cf", "cf_", "__host-", "__secure-"];
const ESSENTIAL_FRAGMENTS: &[&str] = &["session", "sess", "csrf", "xsrf", "consent"];

/// 同意管理平台签名：(名称, HTML 特征)
const CMP_SIGNATURES: &[(&str, &[&str])] = &[
    ("OneTrust", &["onetrust", "optanon"]),
    ("Cookiebot", &["cookiebot"]),
    ("Didomi", &["didomi"]),
    ("Axeptio", &["axeptio"]),
    ("Tarteaucitron", &["tarteaucitron"]),
    ("Quantcast", &["quantcast.mgr", "quantcast choice", "cmp.quantcast"]),
    ("TrustArc", &["trustarc", "consent.truste.com"]),
    ("Usercentrics", &["usercentrics"]),
    ("Iubenda", &["iubenda"]),
    ("CookieYes", &["cookieyes", "cookie-law-info"]),
    ("Complianz", &["complianz", "cmplz"]),
    ("Klaro", &["klaro"]),
];

const PRIVACY_KEYWORDS: &[&str] = &[
    "privacy",
    "confidentialit",
    "datenschutz",
    "données personnelles",
    "donnees-personnelles",
    "mentions légales",
    "mentions-legales",
];

#[derive(Debug, Clone)]
pub struct GdprAnalyzer {
    probe: HttpProbe,
}

impl GdprAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe }
    }

    /// 渲染器提供的 Cookie 优先；缺少 HTML 或 Cookie 时自行 GET 补齐
    pub async fn analyze(&self, url: &str, html: Option<&str>, cookies: Option<&[RawCookie]>) -> AuditResult<GdprResult> {
        let page_url = Url::parse(url)?;

        let (html, cookies) = match (html, cookies) {
            (Some(html), Some(cookies)) => (html.to_string(), cookies.to_vec()),
            (html, cookies) => {
                let page = self.probe.fetch_text(url, self.probe.config().request_timeout()).await?;
                let cookies = cookies.map(<[RawCookie]>::to_vec).unwrap_or_else(|| page.headers.cookies());
                (html.map(str::to_string).unwrap_or(page.body), cookies)
            }
        };
        debug!("Evaluating {} cookies for {}", cookies.len(), url);

        let document = HtmlExtractor::parse(&html);
        Ok(evaluate(&html, &document, &cookies, &page_url))
    }
}

#[async_trait]
impl Analyzer for GdprAnalyzer {
    type Output = GdprResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<GdprResult> {
        self.analyze(&ctx.url, ctx.html(), ctx.cookies()).await
    }
}

pub fn categorize_cookie(name: &str) -> CookieCategory {
    let name = name.to_ascii_lowercase();
    let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| name.starts_with(p));

    if has_prefix(ANALYTICS_PREFIXES) || name.contains("amplitude") {
        CookieCategory::Analytics
    } else if has_prefix(MARKETING_PREFIXES) || MARKETING_NAMES.contains(&name.as_str()) {
        CookieCategory::Marketing
    } else if has_prefix(ESSENTIAL_PREFIXES) || ESSENTIAL_FRAGMENTS.iter().any(|f| name.contains(f)) {
        CookieCategory::Essential
    } else {
        CookieCategory::Unknown
    }
}

pub fn detect_cmp(html: &str) -> Option<&'static str> {
    let html = html.to_lowercase();
    CMP_SIGNATURES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| html.contains(n)))
        .map(|(name, _)| *name)
}

/// 第一个 href 或文本命中关键词的链接，解析为绝对地址
pub fn find_privacy_policy(doc: &PageDocument, page_url: &Url) -> Option<String> {
    doc.anchors
        .iter()
        .find(|a| {
            let href = a.href.to_lowercase();
            let text = a.text.to_lowercase();
            PRIVACY_KEYWORDS.iter().any(|k| href.contains(k) || text.contains(k))
        })
        .map(|a| {
            page_url
                .join(a.href.trim())
                .map(|u| u.to_string())
                .unwrap_or_else(|_| a.href.clone())
        })
}

/// 非必要 Cookie：缺少 Secure / SameSite，或在没有 CMP 时于同意前写入，均不合规
fn classify_cookie(cookie: &RawCookie, cmp_present: bool, default_domain: &str) -> CookieItem {
    let category = categorize_cookie(&cookie.name);
    let same_site_set = cookie
        .same_site
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());

    let is_compliant = category.is_essential() || (cookie.secure && same_site_set && cmp_present);
    let risk_level = match (is_compliant, category) {
        (true, _) => Severity::Ok,
        (false, CookieCategory::Marketing) => Severity::High,
        (false, CookieCategory::Analytics) => Severity::Medium,
        (false, _) => Severity::Low,
    };

    CookieItem {
        name: cookie.name.clone(),
        domain: cookie.domain.clone().unwrap_or_else(|| default_domain.to_string()),
        secure: cookie.secure,
        http_only: cookie.http_only,
        path: cookie.path.clone().unwrap_or_else(|| "/".to_string()),
        expires: cookie.expires,
        is_session: cookie.expires.is_none(),
        same_site: cookie.same_site.clone(),
        is_compliant,
        category,
        risk_level,
    }
}

pub fn evaluate(html: &str, doc: &PageDocument, cookies: &[RawCookie], page_url: &Url) -> GdprResult {
    let cmp_detected = detect_cmp(html);
    let privacy_policy_url = find_privacy_policy(doc, page_url);
    let host = page_url.host_str().unwrap_or_default();

    let items: Vec<CookieItem> = cookies
        .iter()
        .map(|c| classify_cookie(c, cmp_detected.is_some(), host))
        .collect();
    let violation_count = items.iter().filter(|c| !c.is_compliant).count();
    let tracking_without_cmp = cmp_detected.is_none() && items.iter().any(|c| !c.category.is_essential());

    let mut score = 100 - 10 * violation_count as i64;
    if privacy_policy_url.is_none() {
        score -= 15;
    }
    if tracking_without_cmp {
        score -= 10;
    }

    GdprResult {
        compliant: violation_count == 0,
        cookies: items,
        violation_count,
        cmp_detected: cmp_detected.map(str::to_string),
        privacy_policy_detected: privacy_policy_url.is_some(),
        privacy_policy_url,
        score: clamp_score(score),
        error: None,
    }
}
