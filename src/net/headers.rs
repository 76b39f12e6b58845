//! 响应头快照（大小写不敏感、保留多值）

use std::collections::HashMap;

use reqwest::header::HeaderMap;

use crate::model::RawCookie;
use crate::utils::HeaderConverter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    values: HashMap<String, Vec<String>>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_header_map(header_map: &HeaderMap) -> Self {
        Self {
            values: HeaderConverter::to_hashmap(header_map),
        }
    }

    /// 追加一个值
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// 链式构造
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// 第一个非空值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .iter()
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_ascii_lowercase())
    }

    /// 头部值总数（多值头按值计）
    pub fn len(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// 解析全部 Set-Cookie
    pub fn cookies(&self) -> Vec<RawCookie> {
        self.get_all("set-cookie")
            .iter()
            .filter_map(|raw| HeaderConverter::parse_set_cookie(raw))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let headers = ResponseHeaders::new()
            .with("Strict-Transport-Security", "max-age=31536000")
            .with("Set-Cookie", "a=1; Secure")
            .with("set-cookie", "b=2");

        assert_eq!(headers.get("strict-transport-security"), Some("max-age=31536000"));
        assert!(headers.contains("STRICT-TRANSPORT-SECURITY"));
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.cookies().len(), 2);
    }
}
