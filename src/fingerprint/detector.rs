//! 指纹匹配引擎
//! 对每项技术逐条评估规则，取单条规则的最高置信度（不叠加），达到阈值才上报

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::compiler::{BUILTIN_SIGNATURES, CompiledRule, CompiledSignatureLibrary, Matcher, SignatureCompiler};
use super::signatures::{RuleKind, TechSignature};
use crate::extractor::PageDocument;
use crate::model::DetectedTechnology;
use crate::net::ResponseHeaders;
use crate::utils::{DetectionHit, DetectionUpdater, VersionExtractor};

/// 上报阈值
pub const DETECTION_THRESHOLD: u8 = 50;

/// 一次检测的全部输入
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub html: &'a str,
    pub headers: &'a ResponseHeaders,
    pub document: &'a PageDocument,
}

/// 技术检测器
#[derive(Debug, Clone)]
pub struct TechDetector {
    library: Arc<CompiledSignatureLibrary>,
}

impl Default for TechDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechDetector {
    /// 使用内置签名库
    pub fn new() -> Self {
        Self {
            library: Arc::clone(&BUILTIN_SIGNATURES),
        }
    }

    /// 使用自定义签名表
    pub fn from_catalog(catalog: &[TechSignature]) -> Self {
        Self {
            library: Arc::new(SignatureCompiler::compile(catalog)),
        }
    }

    /// 按签名表顺序返回检测结果
    pub fn detect(&self, input: &DetectionInput<'_>) -> Vec<DetectedTechnology> {
        let cookie_haystack = cookie_haystack(input.headers);
        let mut technologies = Vec::new();

        for sig in &self.library.signatures {
            let mut detected: HashMap<String, DetectionHit> = HashMap::new();

            for rule in &sig.rules {
                if let Some(version) = evaluate(rule, input, &cookie_haystack) {
                    debug!(
                        "{} matched {} rule `{}` (confidence {})",
                        sig.name,
                        rule.kind.as_str(),
                        rule.matcher.describe(),
                        rule.confidence
                    );
                    DetectionUpdater::update(&mut detected, sig.name, rule.confidence, version);
                }
            }

            let Some(hit) = detected.remove(sig.name) else {
                continue;
            };
            if hit.confidence < DETECTION_THRESHOLD {
                continue;
            }

            let mut tech = DetectedTechnology::new(sig.name, hit.confidence);
            tech.version = hit.version;
            tech.categories = sig.categories.iter().map(|c| c.to_string()).collect();
            tech.icon = Some(
                sig.icon
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}.svg", sig.name)),
            );
            tech.website = sig.website.map(str::to_string);
            technologies.push(tech);
        }

        technologies
    }
}

/// 命中返回 Some(版本)，未命中返回 None
fn evaluate(rule: &CompiledRule, input: &DetectionInput<'_>, cookies: &str) -> Option<Option<String>> {
    match rule.kind {
        RuleKind::Html => match_text(rule, input.html),
        RuleKind::Header(name) => input
            .headers
            .get_all(name)
            .iter()
            .find_map(|value| match_text(rule, value)),
        RuleKind::Meta(name) => input
            .document
            .meta_tags
            .iter()
            .filter(|m| m.name.as_deref() == Some(name) || m.property.as_deref() == Some(name))
            .find_map(|m| match_text(rule, &m.content)),
        RuleKind::Cookie => rule.matcher.is_match(cookies).then_some(None),
    }
}

fn match_text(rule: &CompiledRule, text: &str) -> Option<Option<String>> {
    match &rule.matcher {
        Matcher::Regex(regex) => regex
            .captures(text)
            .map(|captures| VersionExtractor::extract(rule.version_template, &captures)),
        Matcher::Contains(_) => rule.matcher.is_match(text).then_some(None),
    }
}

/// Set-Cookie 与 Cookie 头合并后的检索文本
fn cookie_haystack(headers: &ResponseHeaders) -> String {
    headers
        .get_all("set-cookie")
        .iter()
        .chain(headers.get_all("cookie"))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ")
}
