//! 邮件域 DNS 健康维度结果模型

use serde::{Deserialize, Serialize};

use super::common::{Dimension, impl_dimension_result};

/// SPF / DMARC 记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Valid,
    Warning,
    Critical,
    #[default]
    Missing,
}

/// DKIM 探测状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DkimStatus {
    Found,
    Missing,
    #[default]
    ManualCheck,
}

pub const DKIM_NOTE: &str = "DKIM uses cryptic selectors (e.g. google._domainkey). We checked common ones but a manual check is recommended.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpfInfo {
    pub present: bool,
    pub record: Option<String>,
    pub status: RecordStatus,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DmarcInfo {
    pub present: bool,
    pub record: Option<String>,
    /// none / quarantine / reject
    pub policy: Option<String>,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DkimInfo {
    pub present: bool,
    pub selectors_checked: Vec<String>,
    pub selectors_found: Vec<String>,
    pub status: DkimStatus,
    pub note: String,
}

impl Default for DkimInfo {
    fn default() -> Self {
        Self {
            present: false,
            selectors_checked: Vec::new(),
            selectors_found: Vec::new(),
            status: DkimStatus::ManualCheck,
            note: DKIM_NOTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsHealthResult {
    pub spf: SpfInfo,
    pub dmarc: DmarcInfo,
    pub dkim: DkimInfo,
    pub domain: Option<String>,
    pub server_ip: Option<String>,
    pub score: u8,
    pub error: Option<String>,
}

impl_dimension_result!(DnsHealthResult, Dimension::DnsHealth);
