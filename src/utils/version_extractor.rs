//! 版本提取工具模块
//! 根据签名上的版本模板，从正则捕获中拼出版本号
//! 模板支持 \1/\2 与 $1/$2 两种分组引用

use regex::Captures;

/// 版本提取工具类
pub struct VersionExtractor;

impl VersionExtractor {
    /// 从正则捕获结果中提取有效版本号
    ///
    /// 模板为空、分组未参与匹配、结果残留占位符时返回 None
    pub fn extract(version_template: Option<&str>, captures: &Captures) -> Option<String> {
        let template = version_template.filter(|t| !t.trim().is_empty())?;

        let mut version = template.to_string();
        let mut replaced = false;

        // 倒序替换，避免 \1 误伤 \10
        for group_index in (1..captures.len()).rev() {
            let backslash = format!("\\{}", group_index);
            let dollar = format!("${}", group_index);
            if !version.contains(&backslash) && !version.contains(&dollar) {
                continue;
            }

            let matched = captures
                .get(group_index)
                .map(|m| m.as_str().trim())
                .unwrap_or("");
            if !matched.is_empty() {
                replaced = true;
            }
            version = version.replace(&backslash, matched).replace(&dollar, matched);
        }

        let version = version.trim();
        let valid = replaced && !version.is_empty() && !version.contains('\\') && !version.contains('$');
        valid.then(|| version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_extract_generator_version() {
        let regex = Regex::new(r"(?i)WordPress\s*([\d.]+)?").unwrap();
        let captures = regex.captures("WordPress 6.4.2").unwrap();

        assert_eq!(VersionExtractor::extract(Some("\\1"), &captures), Some("6.4.2".to_string()));
        assert_eq!(VersionExtractor::extract(Some("$1"), &captures), Some("6.4.2".to_string()));
    }

    #[test]
    fn test_optional_group_not_matched() {
        let regex = Regex::new(r"(?i)nginx(?:/([\d.]+))?").unwrap();
        let captures = regex.captures("nginx").unwrap();
        assert_eq!(VersionExtractor::extract(Some("\\1"), &captures), None);
    }

    #[test]
    fn test_no_template_means_no_version() {
        let regex = Regex::new(r"react(?:@([\d.]+))?").unwrap();
        let captures = regex.captures("react@18.2.0").unwrap();
        assert_eq!(VersionExtractor::extract(None, &captures), None);
        assert_eq!(VersionExtractor::extract(Some("\\2"), &captures), None);
    }
}
