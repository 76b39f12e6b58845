//! 死链维度结果模型

use serde::{Deserialize, Serialize};

use super::common::{Dimension, impl_dimension_result};

/// 链接失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkErrorType {
    HttpError,
    Timeout,
    ConnectionError,
    UnknownError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub url: String,
    /// 网络层失败时为 0
    pub status_code: u16,
    pub source_text: Option<String>,
    pub is_internal: bool,
    pub error_type: LinkErrorType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrokenLinksResult {
    pub total_links_checked: usize,
    pub broken_links: Vec<BrokenLink>,
    pub broken_count: usize,
    pub internal_broken: usize,
    pub external_broken: usize,
    pub error: Option<String>,
}

impl_dimension_result!(BrokenLinksResult, Dimension::BrokenLinks);
