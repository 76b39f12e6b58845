//! 签名编译器
//! 把静态签名表编译为可执行的匹配器，全部正则忽略大小写

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::signatures::{RuleKind, SignatureRule, TECH_SIGNATURES, TechSignature};
use crate::error::AuditResult;

#[derive(Debug, Clone)]
pub enum Matcher {
    Contains(String), // 子串匹配（忽略大小写）
    Regex(Regex),     // 正则匹配
}

impl Matcher {
    pub fn is_match(&self, input: &str) -> bool {
        match self {
            Matcher::Contains(needle) => input.to_lowercase().contains(needle.as_str()),
            Matcher::Regex(regex) => regex.is_match(input),
        }
    }

    /// 规则描述
    pub fn describe(&self) -> &str {
        match self {
            Matcher::Contains(needle) => needle,
            Matcher::Regex(r) => r.as_str(),
        }
    }
}

/// 编译后的单条规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub kind: RuleKind,
    pub matcher: Matcher,
    pub confidence: u8,
    pub version_template: Option<&'static str>,
}

/// 编译后的单项技术
#[derive(Debug, Clone)]
pub struct CompiledSignature {
    pub name: &'static str,
    pub categories: &'static [&'static str],
    pub icon: Option<&'static str>,
    pub website: Option<&'static str>,
    pub rules: Vec<CompiledRule>,
}

/// 编译后的签名库（保持签名表顺序）
#[derive(Debug, Clone, Default)]
pub struct CompiledSignatureLibrary {
    pub signatures: Vec<CompiledSignature>,
}

/// 内置签名库，首次使用时编译
pub static BUILTIN_SIGNATURES: Lazy<Arc<CompiledSignatureLibrary>> =
    Lazy::new(|| Arc::new(SignatureCompiler::compile(TECH_SIGNATURES)));

/// 签名编译器
pub struct SignatureCompiler;

impl SignatureCompiler {
    /// 编译签名表；单条非法正则只跳过该规则
    pub fn compile(catalog: &[TechSignature]) -> CompiledSignatureLibrary {
        let start = Instant::now();
        let mut signatures = Vec::with_capacity(catalog.len());
        let mut rule_count = 0;

        for sig in catalog {
            let rules: Vec<CompiledRule> = sig
                .rules
                .iter()
                .filter_map(|rule| match Self::compile_rule(rule) {
                    Ok(compiled) => Some(compiled),
                    Err(e) => {
                        warn!("Skipping invalid {} rule for {}: {}", rule.kind.as_str(), sig.name, e);
                        None
                    }
                })
                .collect();
            rule_count += rules.len();

            signatures.push(CompiledSignature {
                name: sig.name,
                categories: sig.categories,
                icon: sig.icon,
                website: sig.website,
                rules,
            });
        }

        debug!(
            "Compiled {} signatures ({} rules) in {:?}",
            signatures.len(),
            rule_count,
            start.elapsed()
        );

        CompiledSignatureLibrary { signatures }
    }

    fn compile_rule(rule: &SignatureRule) -> AuditResult<CompiledRule> {
        let matcher = match rule.kind {
            RuleKind::Cookie => Matcher::Contains(rule.pattern.to_lowercase()),
            _ => Matcher::Regex(RegexBuilder::new(rule.pattern).case_insensitive(true).build()?),
        };

        Ok(CompiledRule {
            kind: rule.kind,
            matcher,
            confidence: rule.confidence.min(100),
            version_template: rule.version,
        })
    }
}
