//! Header格式转换工具
//! HeaderMap → 小写多值表；Set-Cookie 解析

use std::collections::HashMap;

use chrono::DateTime;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::model::RawCookie;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 将HeaderMap转换为HashMap<String, Vec<String>>（键小写）
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();

        for (key, value) in header_map.iter() {
            // 非 ASCII 值按有损转换保留
            let value_str = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            };
            map.entry(key.as_str().to_lowercase())
                .or_default()
                .push(value_str);
        }

        debug!("Header conversion produced {} entries", map.len());
        map
    }

    /// 解析单条 Set-Cookie 头
    pub fn parse_set_cookie(header: &str) -> Option<RawCookie> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = RawCookie {
            name: name.to_string(),
            value: value.trim().trim_matches('"').to_string(),
            ..RawCookie::default()
        };
        let mut max_age = None;

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr.trim(), None),
            };
            match key.to_ascii_lowercase().as_str() {
                "domain" => cookie.domain = val.map(|d| d.to_string()),
                "path" => cookie.path = val.map(|p| p.to_string()),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => cookie.same_site = val.map(|s| s.to_string()),
                "expires" => {
                    cookie.expires = val
                        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
                        .map(|dt| dt.timestamp() as f64);
                }
                "max-age" => max_age = val.and_then(|v| v.parse::<i64>().ok()),
                _ => {}
            }
        }

        // Max-Age 优先于 Expires
        if let Some(secs) = max_age {
            cookie.expires = Some((chrono::Utc::now().timestamp() + secs) as f64);
        }

        Some(cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SET_COOKIE};

    #[test]
    fn test_to_hashmap_lowercases_and_keeps_multi_values() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Powered-By", HeaderValue::from_static("PHP/8.1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let map = HeaderConverter::to_hashmap(&headers);
        assert_eq!(map["x-powered-by"], vec!["PHP/8.1".to_string()]);
        assert_eq!(map["set-cookie"].len(), 2);
    }

    #[test]
    fn test_parse_set_cookie_attributes() {
        let cookie = HeaderConverter::parse_set_cookie(
            "_ga=GA1.2.3; Domain=.example.com; Path=/; Secure; SameSite=Lax; Expires=Wed, 21 Oct 2037 07:28:00 GMT",
        )
        .unwrap();

        assert_eq!(cookie.name, "_ga");
        assert_eq!(cookie.domain.as_deref(), Some(".example.com"));
        assert!(cookie.secure);
        assert!(!cookie.http_only);
        assert_eq!(cookie.same_site.as_deref(), Some("Lax"));
        assert!(cookie.expires.is_some());
    }

    #[test]
    fn test_parse_session_cookie() {
        let cookie = HeaderConverter::parse_set_cookie("PHPSESSID=abc; HttpOnly").unwrap();
        assert!(cookie.http_only);
        assert_eq!(cookie.expires, None);
        assert!(HeaderConverter::parse_set_cookie("garbage").is_none());
    }
}
