use std::sync::Arc;

use futures::StreamExt;
use rsiteauditor::model::Dimension;
use rsiteauditor::scanner::{step, weighted_score};
use rsiteauditor::{ConfigManager, GlobalConfig, ProgressEvent, ScanStatus, Scanner, StaticRenderer};
use serde_json::json;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html><head>
<title>Example shop</title>
<meta name="description" content="Handmade goods shipped worldwide">
<meta property="og:title" content="Example shop">
</head><body><h1>Welcome</h1><a href="/about">About</a></body></html>"#;

/// 外部服务全部指向 mock：PageSpeed 500，DoH 一律 NXDOMAIN
async fn mocked_config(server: &MockServer) -> GlobalConfig {
    Mock::given(path("/pagespeed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
        .mount(server)
        .await;
    Mock::given(path("/resolve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": 3})))
        .mount(server)
        .await;

    ConfigManager::custom()
        .pagespeed_api_url(format!("{}/pagespeed", server.uri()))
        .doh_url(format!("{}/resolve", server.uri()))
        .probe_timeout(5)
        .request_timeout(5)
        .resource_timeout(2)
        .ssl_timeout(2)
        .build()
}

#[tokio::test]
async fn test_scan_survives_seo_failure() {
    let server = MockServer::start().await;
    let config = mocked_config(&server).await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let scanner = Scanner::new(config).unwrap();
    let result = scanner.run_scan(&format!("{}/", server.uri()), "en").await.unwrap();

    assert_eq!(result.status, ScanStatus::Completed);
    assert!(result.seo.error.is_some());
    assert_eq!(
        result.errors.iter().filter(|e| e.starts_with("SEO analysis failed")).count(),
        1
    );
    // 每个失败维度恰好对应一条顶层错误
    let failed = Dimension::ALL.iter().filter(|d| result.dimension_error(**d).is_some()).count();
    assert_eq!(result.errors.len(), failed);
    assert_eq!(result.global_score(), weighted_score(&result));
    assert!(result.scan_duration_seconds.is_some());
}

#[tokio::test]
async fn test_stream_event_order() {
    let server = MockServer::start().await;
    let config = mocked_config(&server).await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "text/html").set_body_string(PAGE))
        .mount(&server)
        .await;
    Mock::given(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let scanner = Scanner::new(config)
        .unwrap()
        .with_renderer(Arc::new(StaticRenderer::new(PAGE)));
    let events: Vec<ProgressEvent> = scanner
        .run_scan_stream(&format!("{}/", server.uri()), "en")
        .collect()
        .await;

    assert_eq!(events.first().and_then(|e| e.step()), Some(step::INIT));
    let last = events.last().unwrap();
    assert!(matches!(last, ProgressEvent::Complete { .. }));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let steps: Vec<&str> = events.iter().filter_map(|e| e.step()).collect();
    for dimension in Dimension::ALL {
        assert_eq!(steps.iter().filter(|s| **s == dimension.key()).count(), 1, "{}", dimension.key());
    }
    let finalize = steps.iter().position(|s| *s == step::FINALIZE).unwrap();
    let analysis = steps.iter().position(|s| *s == step::ANALYSIS).unwrap();
    assert!(analysis < finalize);
    assert_eq!(finalize, steps.len() - 1);

    let ProgressEvent::Complete { data } = last else { unreachable!() };
    // PageSpeed 不可用时退回本地分析
    assert!(data.seo.error.is_none());
    assert!(data.seo.diagnostics.iter().any(|d| d.id == "local-fallback"));
    assert_eq!(data.broken_links.broken_count, 0);
    assert_eq!(data.dns_health.score, 0);
    assert_eq!(data.global_score(), weighted_score(data));
}

#[tokio::test]
async fn test_compare_tolerates_unreachable_competitor() {
    let server = MockServer::start().await;
    let config = mocked_config(&server).await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let scanner = Scanner::new(config)
        .unwrap()
        .with_renderer(Arc::new(StaticRenderer::new(PAGE)));
    let target = format!("{}/", server.uri());
    // 竞品不可达：只记录错误，不影响主扫描
    let result = scanner.compare(&target, "http://127.0.0.1:9/", "en").await.unwrap();

    assert!(result.versus_mode);
    assert!(result.competitor.is_none());
    assert!(result.errors.iter().any(|e| e.starts_with("Competitor scan failed")));
}
