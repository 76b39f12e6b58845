//! 共享 HTTP 探测工具
//! 所有分析器的原始网络访问都经由这里：HEAD→GET 回退、超时、关闭证书校验、重定向策略

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, RANGE};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use tracing::debug;

use super::headers::ResponseHeaders;
use crate::config::GlobalConfig;
use crate::error::AuditResult;

/// 头部数少于该值时视为 HEAD 不可信，改用 GET
const MIN_TRUSTED_HEADERS: usize = 3;

/// 体积探测声明的编码，服务端按压缩后的长度回报
const SIZE_PROBE_ENCODINGS: &str = "gzip, deflate, br";

/// 仅状态与头部的探测结果
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub final_url: String,
    pub headers: ResponseHeaders,
}

impl ProbeResponse {
    fn from_response(resp: &Response) -> Self {
        Self {
            status: resp.status().as_u16(),
            final_url: resp.url().to_string(),
            headers: ResponseHeaders::from_header_map(resp.headers()),
        }
    }
}

/// 带正文的页面
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub status: u16,
    pub headers: ResponseHeaders,
    pub body: String,
    pub bytes: usize,
}

#[derive(Debug, Clone)]
pub struct HttpProbe {
    lenient: Client,
    no_redirect: Client,
    /// 不自动解压：解压器会丢弃 Content-Length
    sizing: Client,
    config: Arc<GlobalConfig>,
}

impl HttpProbe {
    pub fn new(config: Arc<GlobalConfig>) -> AuditResult<Self> {
        let lenient = Client::builder()
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .redirect(Policy::limited(10))
            .timeout(config.request_timeout())
            .build()?;

        let no_redirect = Client::builder()
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .timeout(config.request_timeout())
            .build()?;

        let sizing = Client::builder()
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .redirect(Policy::limited(10))
            .no_gzip()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            lenient,
            no_redirect,
            sizing,
            config,
        })
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// 底层客户端（外部 API 调用复用连接池）
    pub fn client(&self) -> &Client {
        &self.lenient
    }

    pub async fn head(&self, url: &str, timeout: Duration) -> AuditResult<ProbeResponse> {
        let resp = self.lenient.head(url).timeout(timeout).send().await?;
        Ok(ProbeResponse::from_response(&resp))
    }

    /// GET 但不读取正文
    pub async fn get(&self, url: &str, timeout: Duration) -> AuditResult<ProbeResponse> {
        let resp = self.lenient.get(url).timeout(timeout).send().await?;
        Ok(ProbeResponse::from_response(&resp))
    }

    /// HEAD 优先；HEAD 传输失败、状态 ≥400 或头部过少时改用 GET
    pub async fn head_then_get(&self, url: &str, timeout: Duration) -> AuditResult<ProbeResponse> {
        let head = match self.head(url, timeout).await {
            Ok(head) => head,
            Err(e) => {
                debug!("HEAD {} failed ({}), retrying with GET", url, e);
                return self.get(url, timeout).await;
            }
        };

        if head.status >= 400 {
            return self.get(url, timeout).await;
        }
        if head.headers.len() < MIN_TRUSTED_HEADERS {
            // HEAD 已证明可达，GET 失败时沿用 HEAD 结果
            return Ok(self.get(url, timeout).await.unwrap_or(head));
        }
        Ok(head)
    }

    /// 下载页面正文
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> AuditResult<FetchedPage> {
        let resp = self.lenient.get(url).timeout(timeout).send().await?;
        let probe = ProbeResponse::from_response(&resp);
        let body = resp.text().await?;

        Ok(FetchedPage {
            final_url: probe.final_url,
            status: probe.status,
            headers: probe.headers,
            bytes: body.len(),
            body,
        })
    }

    /// 不跟随重定向的 HEAD，返回状态码
    pub async fn head_status_no_redirect(&self, url: &str, timeout: Duration) -> AuditResult<u16> {
        let resp = self.no_redirect.head(url).timeout(timeout).send().await?;
        Ok(resp.status().as_u16())
    }

    /// 不跟随重定向的 GET，返回状态码与正文
    pub async fn fetch_text_no_redirect(&self, url: &str, timeout: Duration) -> AuditResult<(u16, String)> {
        let resp = self.no_redirect.get(url).timeout(timeout).send().await?;
        let status = resp.status().as_u16();
        Ok((status, resp.text().await?))
    }

    /// HEAD 读取传输体积（压缩后的 Content-Length），缺失或非法视为 0
    pub async fn content_length(&self, url: &str, timeout: Duration) -> AuditResult<u64> {
        let resp = self
            .sizing
            .head(url)
            .header(ACCEPT_ENCODING, SIZE_PROBE_ENCODINGS)
            .timeout(timeout)
            .send()
            .await?;
        Ok(resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0))
    }

    /// 只取前 1KB 的 GET，返回状态码
    pub async fn ranged_get(&self, url: &str, timeout: Duration) -> AuditResult<u16> {
        let resp = self
            .lenient
            .get(url)
            .header(RANGE, "bytes=0-1024")
            .timeout(timeout)
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }
}
