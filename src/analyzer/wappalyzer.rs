//! Wappalyzer Lookup API 客户端（可选的指纹数据源）

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuditError, AuditResult};
use crate::model::{CompanyInfo, ContactInfo, DetectedTechnology, TechSource, TechStackResult};

#[derive(Debug, Clone)]
pub struct WappalyzerClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

/// API 可能返回单个对象或按 URL 排列的数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupPayload {
    Many(Vec<LookupEntry>),
    One(LookupEntry),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LookupEntry {
    technologies: Vec<ApiTechnology>,
    company_name: Option<String>,
    about: Option<String>,
    industry: Option<String>,
    company_size: Option<String>,
    company_founded: Option<i64>,
    locations: Vec<String>,
    email: Vec<String>,
    phone: Vec<String>,
    twitter: Vec<String>,
    linkedin: Vec<String>,
    facebook: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTechnology {
    name: String,
    #[serde(default)]
    categories: Vec<ApiCategory>,
    #[serde(default)]
    versions: Vec<String>,
    #[serde(default = "full_confidence")]
    confidence: u8,
    #[serde(default)]
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCategory {
    name: String,
}

fn full_confidence() -> u8 {
    100
}

impl WappalyzerClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// 查询并映射为本地结构（未做分类与过时检查）
    pub async fn lookup(&self, url: &str) -> AuditResult<TechStackResult> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("urls", url), ("sets", "all")])
            .header("x-api-key", &self.api_key)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuditError::ExternalApi(format!("Wappalyzer returned status {}", status.as_u16())));
        }

        let payload: LookupPayload = serde_json::from_str(&resp.text().await?)?;
        let entry = match payload {
            LookupPayload::One(entry) => entry,
            LookupPayload::Many(entries) => entries
                .into_iter()
                .next()
                .ok_or_else(|| AuditError::ExternalApi("Wappalyzer returned an empty result".to_string()))?,
        };
        debug!("Wappalyzer reported {} technologies for {}", entry.technologies.len(), url);

        Ok(map_entry(entry))
    }
}

fn map_entry(entry: LookupEntry) -> TechStackResult {
    let technologies = entry
        .technologies
        .into_iter()
        .map(|tech| {
            let icon = format!("{}.svg", tech.name);
            let mut detected = DetectedTechnology::new(tech.name, tech.confidence);
            detected.icon = Some(icon);
            detected.categories = tech.categories.into_iter().map(|c| c.name).collect();
            detected.version = tech.versions.into_iter().next();
            detected.website = tech.website;
            detected
        })
        .collect();

    TechStackResult {
        source: TechSource::Api,
        technologies,
        company: Some(CompanyInfo {
            name: entry.company_name,
            description: entry.about,
            industry: entry.industry,
            size: entry.company_size,
            founded: entry.company_founded,
            location: entry.locations.into_iter().next(),
        }),
        contacts: Some(ContactInfo {
            emails: entry.email,
            phones: entry.phone,
            twitter: entry.twitter,
            linkedin: entry.linkedin,
            facebook: entry.facebook,
        }),
        ..TechStackResult::default()
    }
}
