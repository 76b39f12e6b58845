//! 邮件域 DNS 健康分析器：SPF / DMARC / DKIM（DoH 查询）

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;
use url::Url;

use super::{Analyzer, ScanContext};
use crate::error::{AuditError, AuditResult};
use crate::model::{DkimInfo, DkimStatus, DmarcInfo, DnsHealthResult, RecordStatus, SpfInfo, clamp_score};
use crate::net::{DohResolver, HttpProbe};

/// 常见 DKIM selector 猜测列表（非权威）
pub const DKIM_SELECTORS: &[&str] = &["default", "google", "mail", "k1", "smtp", "sig1"];

#[derive(Debug, Clone)]
pub struct DnsHealthAnalyzer {
    resolver: DohResolver,
}

impl DnsHealthAnalyzer {
    pub fn new(probe: HttpProbe) -> Self {
        let config = probe.config();
        let resolver = DohResolver::new(probe.client().clone(), config.doh_url.clone(), config.probe_timeout());
        Self { resolver }
    }

    pub fn with_resolver(resolver: DohResolver) -> Self {
        Self { resolver }
    }

    pub async fn analyze(&self, url: &str) -> AuditResult<DnsHealthResult> {
        let parsed = Url::parse(url)?;
        let hostname = parsed
            .host_str()
            .ok_or_else(|| AuditError::InvalidInput(format!("URL has no host: {}", url)))?;
        let domain = mail_domain(hostname);

        let dmarc_name = format!("_dmarc.{}", domain);
        let (server_ip, spf_records, dmarc_records, dkim) = tokio::join!(
            self.resolver.lookup_a(hostname),
            self.resolver.lookup_txt(domain),
            self.resolver.lookup_txt(&dmarc_name),
            self.check_dkim(domain),
        );

        let mut result = DnsHealthResult {
            spf: classify_spf(spf_records),
            dmarc: classify_dmarc(dmarc_records),
            dkim,
            domain: Some(domain.to_string()),
            server_ip: server_ip.ok().and_then(|ips| ips.into_iter().next()),
            ..DnsHealthResult::default()
        };
        result.score = calculate_score(&result.spf, &result.dmarc);
        Ok(result)
    }

    /// 任一 selector 查询失败只视为未找到
    async fn check_dkim(&self, domain: &str) -> DkimInfo {
        let lookups = DKIM_SELECTORS.iter().map(|selector| async move {
            let name = format!("{}._domainkey.{}", selector, domain);
            match self.resolver.lookup_txt(&name).await {
                Ok(records) if !records.is_empty() => Some(selector.to_string()),
                Ok(_) => None,
                Err(e) => {
                    debug!("DKIM lookup {} failed: {}", name, e);
                    None
                }
            }
        });
        let selectors_found: Vec<String> = join_all(lookups).await.into_iter().flatten().collect();

        let present = !selectors_found.is_empty();
        DkimInfo {
            present,
            selectors_checked: DKIM_SELECTORS.iter().map(|s| s.to_string()).collect(),
            status: if present { DkimStatus::Found } else { DkimStatus::Missing },
            note: if present {
                format!("Detected active DKIM selectors: {}", selectors_found.join(", "))
            } else {
                "No common DKIM selectors found. Please verify manually in your email provider settings.".to_string()
            },
            selectors_found,
        }
    }
}

#[async_trait]
impl Analyzer for DnsHealthAnalyzer {
    type Output = DnsHealthResult;

    async fn run(&self, ctx: &ScanContext) -> AuditResult<DnsHealthResult> {
        self.analyze(&ctx.url).await
    }
}

/// 仅当主机名形如 www.example.com（恰好两个点）时去掉 www.
pub fn mail_domain(hostname: &str) -> &str {
    match hostname.strip_prefix("www.") {
        Some(rest) if hostname.matches('.').count() == 2 => rest,
        _ => hostname,
    }
}

pub fn classify_spf(records: AuditResult<Vec<String>>) -> SpfInfo {
    let mut spf = SpfInfo::default();
    let records = match records {
        Ok(records) => records,
        Err(e) => {
            debug!("SPF lookup failed: {}", e);
            spf.warnings.push("SPF record not found (DNS error).".to_string());
            return spf;
        }
    };

    let Some(record) = records.into_iter().find(|r| r.to_ascii_lowercase().contains("v=spf1")) else {
        spf.warnings.push("SPF record not found.".to_string());
        return spf;
    };

    let (status, warning) = if record.contains("-all") {
        (RecordStatus::Valid, None)
    } else if record.contains("~all") {
        (
            RecordStatus::Warning,
            Some("SoftFail policy (~all) detected. '-all' is recommended for maximum protection."),
        )
    } else if record.contains("+all") {
        (
            RecordStatus::Critical,
            Some("DANGEROUS +all policy: anyone may send email on behalf of this domain."),
        )
    } else {
        (RecordStatus::Warning, Some("No terminating mechanism (-all or ~all)."))
    };

    spf.present = true;
    spf.record = Some(record);
    spf.status = status;
    spf.warnings.extend(warning.map(str::to_string));
    spf
}

pub fn classify_dmarc(records: AuditResult<Vec<String>>) -> DmarcInfo {
    let mut dmarc = DmarcInfo::default();
    let Ok(records) = records else {
        return dmarc;
    };
    let Some(record) = records.into_iter().find(|r| r.to_ascii_lowercase().contains("v=dmarc1")) else {
        return dmarc;
    };

    let policy = dmarc_policy(&record);
    dmarc.status = match policy.as_deref() {
        Some("reject") | Some("quarantine") => RecordStatus::Valid,
        _ => RecordStatus::Warning,
    };
    dmarc.policy = Some(policy.unwrap_or_else(|| "unknown".to_string()));
    dmarc.present = true;
    dmarc.record = Some(record);
    dmarc
}

/// 解析 `p=` 标签（不含 `sp=`），统一小写
fn dmarc_policy(record: &str) -> Option<String> {
    record.split(';').find_map(|tag| {
        let (key, value) = tag.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("p")
            .then(|| value.trim().to_ascii_lowercase())
    })
}

/// SPF 与 DMARC 同时缺失时强制为 0，优先于其他扣分
pub fn calculate_score(spf: &SpfInfo, dmarc: &DmarcInfo) -> u8 {
    if spf.status == RecordStatus::Missing && dmarc.status == RecordStatus::Missing {
        return 0;
    }

    let mut score: i64 = 100;
    score -= match spf.status {
        RecordStatus::Missing | RecordStatus::Critical => 50,
        RecordStatus::Warning => 20,
        RecordStatus::Valid => 0,
    };
    score -= match dmarc.status {
        RecordStatus::Missing => 40,
        RecordStatus::Warning => 20,
        _ => 0,
    };
    clamp_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(values: &[&str]) -> AuditResult<Vec<String>> {
        Ok(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_mail_domain_strips_www_only_for_two_dots() {
        assert_eq!(mail_domain("www.example.com"), "example.com");
        assert_eq!(mail_domain("www.example.co.uk"), "www.example.co.uk");
        assert_eq!(mail_domain("shop.example.com"), "shop.example.com");
        assert_eq!(mail_domain("example.com"), "example.com");
    }

    #[test]
    fn test_spf_classification() {
        let spf = classify_spf(records(&["google-site-verification=abc", "v=spf1 include:_spf.google.com -all"]));
        assert_eq!(spf.status, RecordStatus::Valid);
        assert!(spf.warnings.is_empty());

        assert_eq!(classify_spf(records(&["v=spf1 ~all"])).status, RecordStatus::Warning);
        assert_eq!(classify_spf(records(&["v=spf1 +all"])).status, RecordStatus::Critical);
        assert_eq!(classify_spf(records(&["v=spf1 mx"])).status, RecordStatus::Warning);

        let missing = classify_spf(records(&[]));
        assert!(!missing.present);
        assert_eq!(missing.status, RecordStatus::Missing);
        assert_eq!(missing.warnings.len(), 1);

        let failed = classify_spf(Err(AuditError::Dns("SERVFAIL".into())));
        assert_eq!(failed.status, RecordStatus::Missing);
    }

    #[test]
    fn test_dmarc_policy_parsing() {
        let dmarc = classify_dmarc(records(&["v=DMARC1; p=Reject; rua=mailto:d@example.com"]));
        assert_eq!(dmarc.policy.as_deref(), Some("reject"));
        assert_eq!(dmarc.status, RecordStatus::Valid);

        // sp= 不应被当作 p=
        let dmarc = classify_dmarc(records(&["v=DMARC1; sp=reject; p=none"]));
        assert_eq!(dmarc.policy.as_deref(), Some("none"));
        assert_eq!(dmarc.status, RecordStatus::Warning);

        let dmarc = classify_dmarc(records(&["v=DMARC1; rua=mailto:d@example.com"]));
        assert_eq!(dmarc.policy.as_deref(), Some("unknown"));
        assert_eq!(dmarc.status, RecordStatus::Warning);

        assert!(!classify_dmarc(records(&["v=spf1 -all"])).present);
    }

    #[test]
    fn test_both_missing_forces_zero() {
        let spf = SpfInfo::default();
        let dmarc = DmarcInfo::default();
        assert_eq!(calculate_score(&spf, &dmarc), 0);
    }

    #[test]
    fn test_score_deductions() {
        let spf = classify_spf(records(&["v=spf1 ~all"]));
        let dmarc = classify_dmarc(records(&[]));
        assert_eq!(calculate_score(&spf, &dmarc), 40);

        let spf = classify_spf(records(&[]));
        let dmarc = classify_dmarc(records(&["v=DMARC1; p=quarantine"]));
        assert_eq!(calculate_score(&spf, &dmarc), 50);

        let spf = classify_spf(records(&["v=spf1 -all"]));
        let dmarc = classify_dmarc(records(&["v=DMARC1; p=reject"]));
        assert_eq!(calculate_score(&spf, &dmarc), 100);
    }
}
