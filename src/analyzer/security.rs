//! 安全分析器：响应头、TLS 证书、敏感文件暴露

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};
use url::Url;

use super::{Analyzer, ScanContext};
use crate::error::{AuditError, AuditResult};
use crate::model::{ExposedFileFinding, SecurityHeaderFinding, SecurityResult, Severity, SslInfo, clamp_score};
use crate::net::{HttpProbe, ResponseHeaders, TlsInspector, TlsProbeError};

/// 安全响应头规格
#[derive(Debug, Clone, Copy)]
pub struct HeaderSpec {
    pub name: &'static str,
    pub severity_missing: Severity,
    pub description: &'static str,
    pub recommendation: &'static str,
}

pub static SECURITY_HEADERS: &[HeaderSpec] = &[
    HeaderSpec {
        name: "Strict-Transport-Security",
        severity_missing: Severity::High,
        description: "HTTP Strict Transport Security (HSTS) forces browsers to use HTTPS",
        recommendation: "Add 'Strict-Transport-Security: max-age=31536000; includeSubDomains; preload'",
    },
    HeaderSpec {
        name: "Content-Security-Policy",
        severity_missing: Severity::High,
        description: "CSP prevents XSS attacks by controlling resource loading",
        recommendation: "Implement a Content-Security-Policy header appropriate for your site",
    },
    HeaderSpec {
        name: "X-Frame-Options",
        severity_missing: Severity::Medium,
        description: "Prevents clickjacking by controlling iframe embedding",
        recommendation: "Add 'X-Frame-Options: DENY' or 'SAMEORIGIN'",
    },
    HeaderSpec {
        name: "X-Content-Type-Options",
        severity_missing: Severity::Medium,
        description: "Prevents MIME-type sniffing attacks",
        recommendation: "Add 'X-Content-Type-Options: nosniff'",
    },
    HeaderSpec {
        name: "X-XSS-Protection",
        severity_missing: Severity::Low,
        description: "Legacy XSS filter (deprecated but still useful)",
        recommendation: "Add 'X-XSS-Protection: 1; mode=block'",
    },
    HeaderSpec {
        name: "Referrer-Policy",
        severity_missing: Severity::Low,
        description: "Controls referrer information sent with requests",
        recommendation: "Add 'Referrer-Policy: strict-origin-when-cross-origin'",
    },
    HeaderSpec {
        name: "Permissions-Policy",
        severity_missing: Severity::Low,
        description: "Controls browser features and APIs",
        recommendation: "Add appropriate Permissions-Policy to limit browser features",
    },
    HeaderSpec {
        name: "X-Permitted-Cross-Domain-Policies",
        severity_missing: Severity::Info,
        description: "Controls cross-domain policies for Flash/PDF",
        recommendation: "Add 'X-Permitted-Cross-Domain-Policies: none'",
    },
];

/// 泄露服务端信息的响应头
pub static DISCLOSURE_HEADERS: &[&str] = &["Server", "X-Powered-By", "X-AspNet-Version"];

#[derive(Debug, Clone, Copy)]
pub struct SensitiveFile {
    pub path: &'static str,
    pub severity: Severity,
    pub description: &'static str,
}

const GIT_EXPOSED: &str = "Git repository exposed! Attackers can download source code";

pub static SENSITIVE_FILES: &[SensitiveFile] = &[
    SensitiveFile { path: "/robots.txt", severity: Severity::Info, description: "Robots.txt is publicly accessible (normal, but review contents)" },
    SensitiveFile { path: "/sitemap.xml", severity: Severity::Info, description: "Sitemap is publicly accessible (normal for SEO)" },
    SensitiveFile { path: "/.git/config", severity: Severity::Critical, description: GIT_EXPOSED },
    SensitiveFile { path: "/.git/HEAD", severity: Severity::Critical, description: GIT_EXPOSED },
    SensitiveFile { path: "/.env", severity: Severity::Critical, description: "Environment file exposed! May contain secrets and credentials" },
    SensitiveFile { path: "/.htaccess", severity: Severity::High, description: "Apache configuration file exposed" },
    SensitiveFile { path: "/wp-config.php", severity: Severity::Critical, description: "WordPress configuration file exposed (may contain DB credentials)" },
    SensitiveFile { path: "/config.php", severity: Severity::High, description: "Configuration file potentially exposed" },
    SensitiveFile { path: "/phpinfo.php", severity: Severity::High, description: "PHP info page exposed (reveals server configuration)" },
    SensitiveFile { path: "/server-status", severity: Severity::Medium, description: "Apache server status page exposed" },
    SensitiveFile { path: "/.svn/entries", severity: Severity::Critical, description: "SVN repository exposed" },
    SensitiveFile { path: "/backup.sql", severity: Severity::Critical, description: "SQL backup file exposed" },
    SensitiveFile { path: "/database.sql", severity: Severity::Critical, description: "SQL database file exposed" },
    SensitiveFile { path: "/.DS_Store", severity: Severity::Low, description: "macOS file system metadata exposed" },
    SensitiveFile { path: "/web.config", severity: Severity::High, description: "IIS configuration file potentially exposed" },
];

/// 软 404 判定：确认请求的正文至少这么长
const MIN_CONFIRMED_BODY: usize = 10;
const FILE_PROBE_CONCURRENCY: usize = 5;

#[derive(Debug, Clone)]
pub struct SecurityAnalyzer {
    probe: HttpProbe,
    tls: TlsInspector,
}

impl SecurityAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        let tls = TlsInspector::new(probe.config().ssl_timeout());
        Self { probe, tls }
    }

    pub async fn analyze(&self, url: &str) -> AuditResult<SecurityResult> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| AuditError::InvalidInput(format!("URL has no host: {}", url)))?
            .to_string();
        let base_url = parsed.origin().ascii_serialization();

        let (headers, ssl, exposed_files) = tokio::join!(
            self.check_headers(url),
            self.check_ssl(&host),
            self.check_exposed_files(&base_url),
        );

        let mut result = SecurityResult {
            headers,
            ssl,
            exposed_files,
            ..SecurityResult::default()
        };
        result.score = calculate_score(&result);
        debug!("Security score for {}: {}", url, result.score);
        Ok(result)
    }

    /// 取不到响应头时按全部缺失处理
    pub async fn check_headers(&self, url: &str) -> Vec<SecurityHeaderFinding> {
        let timeout = self.probe.config().request_timeout();
        let headers = match self.probe.head_then_get(url, timeout).await {
            Ok(resp) => resp.headers,
            Err(e) => {
                warn!("Header check for {} failed: {}", url, e);
                ResponseHeaders::new()
            }
        };
        evaluate_headers(&headers)
    }

    /// 先严格校验；校验失败时关闭校验重连，只为读取证书信息
    pub async fn check_ssl(&self, host: &str) -> SslInfo {
        let mut info = SslInfo::default();

        match self.tls.inspect(host, true).await {
            Ok(details) => {
                fill_ssl_info(&mut info, details);
                info.valid = true;
            }
            Err(err @ TlsProbeError::Verification(_)) => {
                info.valid = false;
                info.error = Some(err.to_string());
                match self.tls.inspect(host, false).await {
                    Ok(details) => fill_ssl_info(&mut info, details),
                    Err(e) => debug!("Unverified TLS retry for {} failed: {}", host, e),
                }
            }
            Err(err) => info.error = Some(err.to_string()),
        }

        info
    }

    /// 每个目录项都产出一条结果，顺序与目录一致
    pub async fn check_exposed_files(&self, base_url: &str) -> Vec<ExposedFileFinding> {
        stream::iter(SENSITIVE_FILES.iter().copied())
            .map(|file| async move { self.probe_file(base_url, &file).await })
            .buffered(FILE_PROBE_CONCURRENCY)
            .collect()
            .await
    }

    async fn probe_file(&self, base_url: &str, file: &SensitiveFile) -> ExposedFileFinding {
        let url = format!("{}{}", base_url, file.path);
        let accessible = self.is_accessible(&url, file.severity).await;

        ExposedFileFinding {
            path: file.path.to_string(),
            accessible,
            severity: if accessible { file.severity } else { Severity::Ok },
            description: accessible.then(|| file.description.to_string()),
        }
    }

    async fn is_accessible(&self, url: &str, severity: Severity) -> bool {
        let timeout = self.probe.config().probe_timeout();
        match self.probe.head_status_no_redirect(url, timeout).await {
            Ok(200) => {}
            Ok(_) => return false,
            Err(e) => {
                debug!("Probe {} failed: {}", url, e);
                return false;
            }
        }

        if severity != Severity::Critical {
            return true;
        }
        // 关键文件再 GET 确认，排除返回 200 的自定义 404 页
        match self.probe.fetch_text_no_redirect(url, timeout).await {
            Ok((200, body)) => body.chars().count() >= MIN_CONFIRMED_BODY,
            _ => false,
        }
    }
}

#[async_trait]
impl Analyzer for SecurityAnalyzer {
    type Output = SecurityResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<SecurityResult> {
        self.analyze(&ctx.url).await
    }
}

fn fill_ssl_info(info: &mut SslInfo, details: crate::net::CertificateDetails) {
    info.issuer = Some(details.issuer);
    info.subject = Some(details.subject);
    info.expires_at = Some(details.expires_at);
    info.days_until_expiry = Some(details.days_until_expiry);
    info.is_expired = details.days_until_expiry < 0;
    info.is_expiring_soon = (0..=30).contains(&details.days_until_expiry);
    info.protocol_version = details.protocol_version;
    info.cipher_suite = details.cipher_suite;
}

/// 每个目录头恰好一条结果；泄露类头存在时为 low，不存在为 ok
pub fn evaluate_headers(headers: &ResponseHeaders) -> Vec<SecurityHeaderFinding> {
    let mut findings = Vec::with_capacity(SECURITY_HEADERS.len() + DISCLOSURE_HEADERS.len());

    for spec in SECURITY_HEADERS {
        let value = headers.get(spec.name).map(str::to_string);
        let present = headers.contains(spec.name);
        findings.push(SecurityHeaderFinding {
            name: spec.name.to_string(),
            value,
            present,
            severity: if present { Severity::Ok } else { spec.severity_missing },
            recommendation: (!present).then(|| spec.recommendation.to_string()),
            description: Some(spec.description.to_string()),
        });
    }

    for &name in DISCLOSURE_HEADERS {
        let value = headers.get(name).map(str::to_string);
        let disclosed = value.is_some();
        findings.push(SecurityHeaderFinding {
            name: name.to_string(),
            value,
            // 泄露类头"存在"即暴露，从不扣分
            present: disclosed,
            severity: if disclosed { Severity::Low } else { Severity::Ok },
            recommendation: disclosed.then(|| format!("Consider removing or obscuring the {} header", name)),
            description: disclosed.then(|| format!("Information disclosure: {} header reveals server info", name)),
        });
    }

    findings
}

/// 100 起扣：缺失头按等级；TLS 问题互斥按优先级；可访问的敏感文件按等级
pub fn calculate_score(result: &SecurityResult) -> u8 {
    let mut score: i64 = 100;

    for header in result.headers.iter().filter(|h| !h.present) {
        score -= match header.severity {
            Severity::Critical => 15,
            Severity::High => 10,
            Severity::Medium => 5,
            Severity::Low => 2,
            _ => 0,
        };
    }

    let ssl = &result.ssl;
    if ssl.error.is_some() {
        score -= 20;
    } else if !ssl.valid {
        score -= 25;
    } else if ssl.is_expired {
        score -= 30;
    } else if ssl.is_expiring_soon {
        score -= 10;
    }

    for file in result.exposed_files.iter().filter(|f| f.accessible) {
        score -= match file.severity {
            Severity::Critical => 25,
            Severity::High => 15,
            Severity::Medium => 5,
            _ => 0,
        };
    }

    clamp_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hardened_headers() -> ResponseHeaders {
        SECURITY_HEADERS
            .iter()
            .fold(ResponseHeaders::new(), |h, spec| h.with(spec.name, "set"))
    }

    fn valid_ssl() -> SslInfo {
        SslInfo {
            valid: true,
            days_until_expiry: Some(200),
            ..SslInfo::default()
        }
    }

    #[test]
    fn test_one_finding_per_catalog_header() {
        for headers in [ResponseHeaders::new(), hardened_headers().with("server", "nginx")] {
            let findings = evaluate_headers(&headers);
            assert_eq!(findings.len(), SECURITY_HEADERS.len() + DISCLOSURE_HEADERS.len());
            for spec in SECURITY_HEADERS {
                assert_eq!(findings.iter().filter(|f| f.name == spec.name).count(), 1);
            }
        }
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let headers = ResponseHeaders::new().with("strict-transport-security", "max-age=1");
        let findings = evaluate_headers(&headers);
        let hsts = findings.iter().find(|f| f.name == "Strict-Transport-Security").unwrap();
        assert!(hsts.present);
        assert_eq!(hsts.severity, Severity::Ok);
        assert_eq!(hsts.value.as_deref(), Some("max-age=1"));
        assert!(hsts.recommendation.is_none());
    }

    #[test]
    fn test_disclosure_header_is_low_without_penalty() {
        let headers = hardened_headers().with("X-Powered-By", "PHP/8.1");
        let result = SecurityResult {
            headers: evaluate_headers(&headers),
            ssl: valid_ssl(),
            ..SecurityResult::default()
        };
        let powered = result.headers.iter().find(|f| f.name == "X-Powered-By").unwrap();
        assert_eq!(powered.severity, Severity::Low);
        assert_eq!(calculate_score(&result), 100);
    }

    #[test]
    fn test_missing_headers_deductions() {
        let result = SecurityResult {
            headers: evaluate_headers(&ResponseHeaders::new()),
            ssl: valid_ssl(),
            ..SecurityResult::default()
        };
        // high 10*2 + medium 5*2 + low 2*3 + info 0
        assert_eq!(calculate_score(&result), 64);
    }

    #[test]
    fn test_tls_deductions_are_exclusive() {
        let base = SecurityResult {
            headers: evaluate_headers(&hardened_headers()),
            ..SecurityResult::default()
        };

        let mut result = base.clone();
        result.ssl = SslInfo { error: Some("x".into()), is_expired: true, ..SslInfo::default() };
        assert_eq!(calculate_score(&result), 80);

        result.ssl = SslInfo { valid: false, ..SslInfo::default() };
        assert_eq!(calculate_score(&result), 75);

        result.ssl = SslInfo { valid: true, is_expired: true, ..SslInfo::default() };
        assert_eq!(calculate_score(&result), 70);

        result.ssl = SslInfo { valid: true, is_expiring_soon: true, ..SslInfo::default() };
        assert_eq!(calculate_score(&result), 90);
    }

    #[test]
    fn test_exposed_files_clamp_to_zero() {
        let mut result = SecurityResult {
            headers: evaluate_headers(&ResponseHeaders::new()),
            ssl: SslInfo { error: Some("timeout".into()), ..SslInfo::default() },
            ..SecurityResult::default()
        };
        result.exposed_files = SENSITIVE_FILES
            .iter()
            .map(|f| ExposedFileFinding {
                path: f.path.to_string(),
                accessible: true,
                severity: f.severity,
                description: Some(f.description.to_string()),
            })
            .collect();
        assert_eq!(calculate_score(&result), 0);
    }
}
