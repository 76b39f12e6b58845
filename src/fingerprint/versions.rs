//! 已知最新版本快照与版本比较

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{DetectedTechnology, Severity};

/// 最新版本快照（非实时数据）
pub static LATEST_VERSIONS: &[(&str, &str)] = &[
    ("WordPress", "6.4.2"),
    ("jQuery", "3.7.1"),
    ("Bootstrap", "5.3.2"),
    ("React", "18.2.0"),
    ("Vue.js", "3.4.5"),
    ("Angular", "17.0.8"),
    ("Next.js", "14.0.4"),
    ("Nuxt.js", "3.9.0"),
    ("PHP", "8.3.1"),
    ("Nginx", "1.25.3"),
    ("Apache", "2.4.58"),
];

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

pub fn latest_version(name: &str) -> Option<&'static str> {
    LATEST_VERSIONS
        .iter()
        .find(|(tech, _)| tech.eq_ignore_ascii_case(name))
        .map(|(_, v)| *v)
}

/// 取前三段数字：(major, minor, patch)，非数字后缀忽略
pub fn normalize_version(version: &str) -> Vec<u64> {
    DIGITS
        .find_iter(version)
        .take(3)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// 填充 latest_version / is_outdated / severity，返回是否过时
pub fn check_outdated(tech: &mut DetectedTechnology) -> bool {
    let Some(latest) = latest_version(&tech.name) else {
        return false;
    };
    tech.latest_version = Some(latest.to_string());

    let Some(current) = tech.version.as_deref().map(normalize_version) else {
        return false;
    };
    // 无数字的版本串无法比较
    if current.is_empty() {
        return false;
    }
    let latest = normalize_version(latest);

    if current < latest {
        tech.is_outdated = true;
        tech.severity = if current[0] != latest[0] {
            Severity::High
        } else {
            Severity::Medium
        };
        return true;
    }
    false
}
