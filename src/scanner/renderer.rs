//! 页面渲染能力
//! 渲染失败不致命，各分析器会自行抓取页面

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AuditError, AuditResult};
use crate::model::RawCookie;
use crate::net::HttpProbe;

/// 渲染产物
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    /// 渲染期间写入的 Cookie
    pub cookies: Vec<RawCookie>,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, timeout: Duration) -> AuditResult<RenderedPage>;
}

/// 不渲染
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRenderer;

#[async_trait]
impl Renderer for NoRenderer {
    async fn render(&self, _url: &str, _timeout: Duration) -> AuditResult<RenderedPage> {
        Err(AuditError::Render("no renderer configured".to_string()))
    }
}

/// 固定页面（离线 / 测试）
#[derive(Debug, Clone, Default)]
pub struct StaticRenderer {
    page: RenderedPage,
}

impl StaticRenderer {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            page: RenderedPage {
                html: html.into(),
                cookies: Vec::new(),
            },
        }
    }

    pub fn with_cookies(mut self, cookies: Vec<RawCookie>) -> Self {
        self.page.cookies = cookies;
        self
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn render(&self, _url: &str, _timeout: Duration) -> AuditResult<RenderedPage> {
        Ok(self.page.clone())
    }
}

/// 普通 GET，不执行脚本；Cookie 取自 Set-Cookie
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    probe: HttpProbe,
}

impl HttpRenderer {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> AuditResult<RenderedPage> {
        let page = self.probe.fetch_text(url, timeout).await?;
        if page.status >= 400 {
            return Err(AuditError::Render(format!("{} returned status {}", url, page.status)));
        }
        debug!("Rendered {} ({} bytes)", page.final_url, page.bytes);

        Ok(RenderedPage {
            cookies: page.headers.cookies(),
            html: page.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_renderer_always_fails() {
        let err = NoRenderer.render("https://example.com", Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, AuditError::Render(_)));
    }

    #[tokio::test]
    async fn test_static_renderer_returns_page() {
        let cookie = RawCookie {
            name: "_ga".into(),
            ..RawCookie::default()
        };
        let renderer = StaticRenderer::new("<html></html>").with_cookies(vec![cookie]);
        let page = renderer.render("https://example.com", Duration::from_secs(1)).await.unwrap();
        assert_eq!(page.html, "<html></html>");
        assert_eq!(page.cookies.len(), 1);
    }
}
