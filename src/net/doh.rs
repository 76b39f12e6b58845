//! DNS-over-HTTPS 查询（JSON API，dns.google / cloudflare-dns 格式）

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuditError, AuditResult};

/// DNS 记录类型（RFC 1035 编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Txt,
}

impl RecordType {
    fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Txt => 16,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Txt => "TXT",
        }
    }
}

const RCODE_NOERROR: u32 = 0;
const RCODE_NXDOMAIN: u32 = 3;

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

#[derive(Debug, Clone)]
pub struct DohResolver {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl DohResolver {
    pub fn new(client: Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// TXT 记录（多段字符串已拼接、去引号）
    pub async fn lookup_txt(&self, name: &str) -> AuditResult<Vec<String>> {
        let records = self.query(name, RecordType::Txt).await?;
        Ok(records.iter().map(|data| unquote_txt(data)).collect())
    }

    pub async fn lookup_a(&self, name: &str) -> AuditResult<Vec<String>> {
        self.query(name, RecordType::A).await
    }

    /// NXDOMAIN 视为空结果，其余非零 rcode 为错误
    async fn query(&self, name: &str, record_type: RecordType) -> AuditResult<Vec<String>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("name", name), ("type", record_type.as_str())])
            .header("accept", "application/dns-json")
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AuditError::Dns(format!(
                "{} {} query returned HTTP {}",
                name,
                record_type.as_str(),
                resp.status()
            )));
        }

        let body: DohResponse = resp.json().await?;
        match body.status {
            RCODE_NOERROR => {}
            RCODE_NXDOMAIN => return Ok(Vec::new()),
            rcode => {
                return Err(AuditError::Dns(format!(
                    "{} {} query failed with rcode {}",
                    name,
                    record_type.as_str(),
                    rcode
                )));
            }
        }

        let records: Vec<String> = body
            .answer
            .into_iter()
            .filter(|a| a.record_type == record_type.code())
            .map(|a| a.data)
            .collect();
        debug!("DoH {} {} -> {} record(s)", record_type.as_str(), name, records.len());
        Ok(records)
    }
}

static TXT_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

/// `"v=spf1 include:a" " ~all"` → `v=spf1 include:a ~all`
fn unquote_txt(data: &str) -> String {
    let segments: Vec<&str> = TXT_SEGMENT
        .captures_iter(data)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if segments.is_empty() {
        data.trim().to_string()
    } else {
        segments.concat().replace("\\\"", "\"")
    }
}
