use std::sync::Arc;
use std::time::Duration;

use rsiteauditor::analyzer::security::{DISCLOSURE_HEADERS, SECURITY_HEADERS};
use rsiteauditor::model::{LinkErrorType, RecordStatus, Severity, TechSource};
use rsiteauditor::{
    BrokenLinksAnalyzer, ConfigManager, DnsHealthAnalyzer, DohResolver, GreenItAnalyzer, HttpProbe, SecurityAnalyzer,
    TechStackAnalyzer,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn probe() -> HttpProbe {
    let config = ConfigManager::custom().probe_timeout(5).request_timeout(5).ssl_timeout(2).build();
    HttpProbe::new(Arc::new(config)).unwrap()
}

async fn respond(server: &MockServer, route: &str, status: u16) {
    Mock::given(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_broken_links_internal_external_asymmetry() {
    let site = MockServer::start().await;
    let third_party = MockServer::start().await;

    respond(&site, "/internal-403", 403).await;
    respond(&site, "/ok", 200).await;
    respond(&third_party, "/external-403", 403).await;
    respond(&third_party, "/external-404", 404).await;

    let html = format!(
        r#"<a href="/internal-403">Members</a>
           <a href="/ok">Home</a>
           <a href="{ext}/external-403">Partner</a>
           <a href="{ext}/external-404">Old partner</a>"#,
        ext = third_party.uri()
    );

    let result = BrokenLinksAnalyzer::new(probe())
        .analyze(&format!("{}/", site.uri()), Some(&html))
        .await
        .unwrap();

    assert_eq!(result.total_links_checked, 4);
    assert_eq!(result.broken_count, 2);
    assert_eq!(result.internal_broken, 1);
    assert_eq!(result.external_broken, 1);

    let internal = result.broken_links.iter().find(|l| l.is_internal).unwrap();
    assert!(internal.url.ends_with("/internal-403"));
    assert_eq!(internal.status_code, 403);
    assert_eq!(internal.error_type, LinkErrorType::HttpError);
    assert_eq!(internal.source_text.as_deref(), Some("Members"));

    assert!(!result.broken_links.iter().any(|l| l.url.ends_with("/external-403")));
    assert!(result.broken_links.iter().any(|l| l.url.ends_with("/external-404")));
}

#[tokio::test]
async fn test_broken_links_network_failure_is_reported() {
    let site = MockServer::start().await;
    // 端口 9 上没有服务
    let html = r#"<a href="http://127.0.0.1:9/gone">Dead host</a>"#;

    let result = BrokenLinksAnalyzer::new(probe())
        .analyze(&format!("{}/", site.uri()), Some(html))
        .await
        .unwrap();

    assert_eq!(result.broken_count, 1);
    let link = &result.broken_links[0];
    assert_eq!(link.status_code, 0);
    assert!(!link.is_internal);
    assert_ne!(link.error_type, LinkErrorType::HttpError);
}

#[tokio::test]
async fn test_security_findings_are_complete() {
    let site = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Strict-Transport-Security", "max-age=31536000")
                .insert_header("X-Frame-Options", "DENY")
                .insert_header("X-Powered-By", "PHP/7.4")
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&site)
        .await;
    Mock::given(path("/.git/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[core]\n\trepositoryformatversion = 0\n"))
        .mount(&site)
        .await;
    // 返回 200 但内容过短，视为软 404
    Mock::given(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("no"))
        .mount(&site)
        .await;
    Mock::given(path("/server-status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Apache Server Status"))
        .mount(&site)
        .await;

    let result = SecurityAnalyzer::new(probe()).analyze(&format!("{}/", site.uri())).await.unwrap();

    assert_eq!(result.headers.len(), SECURITY_HEADERS.len() + DISCLOSURE_HEADERS.len());
    for spec in SECURITY_HEADERS {
        assert_eq!(result.headers.iter().filter(|h| h.name == spec.name).count(), 1);
    }
    let hsts = result.headers.iter().find(|h| h.name == "Strict-Transport-Security").unwrap();
    assert!(hsts.present);
    let csp = result.headers.iter().find(|h| h.name == "Content-Security-Policy").unwrap();
    assert!(!csp.present);
    assert_eq!(csp.severity, Severity::High);
    let powered = result.headers.iter().find(|h| h.name == "X-Powered-By").unwrap();
    assert_eq!(powered.severity, Severity::Low);

    assert_eq!(result.exposed_files.len(), 15);
    let git = result.exposed_files.iter().find(|f| f.path == "/.git/config").unwrap();
    assert!(git.accessible);
    assert_eq!(git.severity, Severity::Critical);
    let env = result.exposed_files.iter().find(|f| f.path == "/.env").unwrap();
    assert!(!env.accessible);
    assert_eq!(env.severity, Severity::Ok);
    assert!(result.exposed_files.iter().find(|f| f.path == "/server-status").unwrap().accessible);

    // 没有 443 端口：TLS 检查失败但不影响其余检查
    assert!(result.ssl.error.is_some());
    assert!(result.score <= 100 - 25 - 5);
}

fn doh_answer(data: &str) -> serde_json::Value {
    json!({"Status": 0, "Answer": [{"name": "x", "type": 16, "TTL": 300, "data": data}]})
}

async fn dns_analyzer(server: &MockServer) -> DnsHealthAnalyzer {
    // 未匹配的查询一律 NXDOMAIN
    Mock::given(method("GET"))
        .and(path("/resolve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": 3})))
        .with_priority(10)
        .mount(server)
        .await;
    let resolver = DohResolver::new(
        reqwest::Client::new(),
        format!("{}/resolve", server.uri()),
        Duration::from_secs(5),
    );
    DnsHealthAnalyzer::with_resolver(resolver)
}

#[tokio::test]
async fn test_dns_both_missing_forces_zero() {
    let server = MockServer::start().await;
    let analyzer = dns_analyzer(&server).await;

    let result = analyzer.analyze("https://www.example.com/").await.unwrap();

    assert_eq!(result.domain.as_deref(), Some("example.com"));
    assert_eq!(result.spf.status, RecordStatus::Missing);
    assert_eq!(result.dmarc.status, RecordStatus::Missing);
    assert_eq!(result.score, 0);
    assert_eq!(result.dkim.selectors_checked.len(), 6);
    assert!(!result.dkim.present);
}

#[tokio::test]
async fn test_dns_records_are_classified() {
    let server = MockServer::start().await;
    Mock::given(path("/resolve"))
        .and(query_param("name", "example.com"))
        .and(query_param("type", "TXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doh_answer("\"v=spf1 include:_spf.example.net -all\"")))
        .mount(&server)
        .await;
    Mock::given(path("/resolve"))
        .and(query_param("name", "_dmarc.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doh_answer("\"v=DMARC1; p=none\"")))
        .mount(&server)
        .await;
    Mock::given(path("/resolve"))
        .and(query_param("name", "google._domainkey.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doh_answer("\"v=DKIM1; k=rsa; p=MIGf\"")))
        .mount(&server)
        .await;
    let analyzer = dns_analyzer(&server).await;

    let result = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(result.spf.status, RecordStatus::Valid);
    assert_eq!(result.spf.record.as_deref(), Some("v=spf1 include:_spf.example.net -all"));
    assert_eq!(result.dmarc.policy.as_deref(), Some("none"));
    assert_eq!(result.score, 80);
    assert_eq!(result.dkim.selectors_found, vec!["google"]);
}

#[tokio::test]
async fn test_green_grade_from_page_weight() {
    let site = MockServer::start().await;
    respond(&site, "/missing.js", 404).await;

    // 900KB 页面：0.879MB → 0.527g → B
    let mut html = String::from(r#"<script src="/missing.js"></script>"#);
    html.push_str(&"x".repeat(900 * 1024 - html.len()));

    let result = GreenItAnalyzer::new(probe())
        .analyze(&format!("{}/", site.uri()), Some(&html))
        .await
        .unwrap();

    assert_eq!(result.resource_count, 2);
    assert_eq!(result.total_size_mb, 0.879);
    assert_eq!(result.co2_grams, 0.527);
    assert_eq!(result.grade, "B");
    assert_eq!(result.score, 85);
}

#[tokio::test]
async fn test_green_counts_compressed_assets() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/bundle.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/javascript")
                .insert_header("Content-Encoding", "gzip")
                .insert_header("Content-Length", "2000000"),
        )
        .mount(&site)
        .await;

    let html = r#"<html><head><script src="/bundle.js"></script></head><body></body></html>"#;
    let result = GreenItAnalyzer::new(probe())
        .analyze(&format!("{}/", site.uri()), Some(html))
        .await
        .unwrap();

    // 2,000,000 字节 ≈ 1.907MB → 1.144g → C
    assert_eq!(result.resource_count, 2);
    assert_eq!(result.total_size_mb, 1.907);
    assert_eq!(result.grade, "C");
}

#[tokio::test]
async fn test_tech_falls_back_when_fingerprint_api_fails() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("sets", "all"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&api)
        .await;

    let config = ConfigManager::custom()
        .wappalyzer_api_key("test-key")
        .wappalyzer_api_url(format!("{}/lookup", api.uri()))
        .request_timeout(5)
        .build();
    let analyzer = TechStackAnalyzer::new(HttpProbe::new(Arc::new(config)).unwrap());
    let html = r#"<html><head><script src="https://code.jquery.com/jquery-3.7.1.min.js"></script></head></html>"#;

    let result = analyzer.analyze("https://shop.example/", Some(html), None).await.unwrap();

    assert_eq!(result.source, TechSource::Local);
    assert!(result.error.is_none());
    assert!(result.technologies.iter().any(|t| t.name == "jQuery"));
}
