//! 技术栈维度结果模型

use serde::{Deserialize, Serialize};

use super::common::{Dimension, Severity, impl_dimension_result};

/// 检测到的技术
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTechnology {
    pub name: String,
    /// 有序去重
    pub categories: Vec<String>,
    pub version: Option<String>,
    pub latest_version: Option<String>,
    pub is_outdated: bool,
    pub confidence: u8,
    pub icon: Option<String>,
    pub website: Option<String>,
    pub severity: Severity,
}

impl DetectedTechnology {
    pub fn new(name: impl Into<String>, confidence: u8) -> Self {
        Self {
            name: name.into(),
            categories: Vec::new(),
            version: None,
            latest_version: None,
            is_outdated: false,
            confidence: confidence.min(100),
            icon: None,
            website: None,
            severity: Severity::Ok,
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }
}

/// 检测来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechSource {
    #[default]
    Local,
    Api,
}

/// 公司信息（仅外部指纹服务提供）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub founded: Option<i64>,
    pub location: Option<String>,
}

/// 联系方式（仅外部指纹服务提供）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub twitter: Vec<String>,
    pub linkedin: Vec<String>,
    pub facebook: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechStackResult {
    pub source: TechSource,
    pub technologies: Vec<DetectedTechnology>,
    pub company: Option<CompanyInfo>,
    pub contacts: Option<ContactInfo>,
    pub cms: Option<String>,
    pub framework: Option<String>,
    pub server: Option<String>,
    pub programming_language: Option<String>,
    pub cdn: Option<String>,
    pub analytics: Vec<String>,
    pub outdated_count: usize,
    pub error: Option<String>,
}

impl_dimension_result!(TechStackResult, Dimension::TechStack);
