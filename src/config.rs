//! 全局配置管理,存储所有可配置项

use std::env;
use std::time::Duration;

/// 浏览器风格 UA，部分站点会拦截非浏览器请求
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_PAGESPEED_API_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
pub const DEFAULT_WAPPALYZER_API_URL: &str = "https://api.wappalyzer.com/v2/lookup/";
pub const DEFAULT_DOH_URL: &str = "https://dns.google/resolve";

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 超时配置（单位：秒）
    pub request_timeout: u64,
    pub probe_timeout: u64,
    pub resource_timeout: u64,
    pub ssl_timeout: u64,
    pub render_timeout: u64,
    pub pagespeed_timeout: u64,
    // 外部服务
    pub pagespeed_api_key: Option<String>,
    pub pagespeed_api_url: String,
    pub wappalyzer_api_key: Option<String>,
    pub wappalyzer_api_url: String,
    pub doh_url: String,
    pub user_agent: String,
    // 并发与上限
    pub link_concurrency: usize,
    pub resource_concurrency: usize,
    pub max_links: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            request_timeout: 30,
            probe_timeout: 10,
            resource_timeout: 5,
            ssl_timeout: 10,
            render_timeout: 30,
            pagespeed_timeout: 90,
            pagespeed_api_key: None,
            pagespeed_api_url: DEFAULT_PAGESPEED_API_URL.to_string(),
            wappalyzer_api_key: None,
            wappalyzer_api_url: DEFAULT_WAPPALYZER_API_URL.to_string(),
            doh_url: DEFAULT_DOH_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            link_concurrency: 10,
            resource_concurrency: 10,
            max_links: 50,
        }
    }
}

impl GlobalConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }

    pub fn resource_timeout(&self) -> Duration {
        Duration::from_secs(self.resource_timeout)
    }

    pub fn ssl_timeout(&self) -> Duration {
        Duration::from_secs(self.ssl_timeout)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout)
    }

    pub fn pagespeed_timeout(&self) -> Duration {
        Duration::from_secs(self.pagespeed_timeout)
    }

    /// PageSpeed key 是否可用（占位值/过短视为未配置，走匿名模式）
    pub fn has_pagespeed_key(&self) -> bool {
        self.pagespeed_api_key
            .as_deref()
            .is_some_and(is_usable_api_key)
    }
}

fn is_usable_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != "your_api_key_here" && key.len() > 10
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 从环境变量读取配置，未设置的项保持默认值
    pub fn from_env() -> GlobalConfig {
        let mut builder = CustomConfigBuilder::new();

        if let Some(key) = read_env("GOOGLE_PAGESPEED_API_KEY") {
            builder = builder.pagespeed_api_key(key);
        }
        if let Some(key) = read_env("WAPPALYZER_API_KEY") {
            builder = builder.wappalyzer_api_key(key);
        }
        if let Some(secs) = read_env("REQUEST_TIMEOUT").and_then(|v| v.parse().ok()) {
            builder = builder.request_timeout(secs);
        }
        if let Some(secs) = read_env("SSL_TIMEOUT").and_then(|v| v.parse().ok()) {
            builder = builder.ssl_timeout(secs);
        }
        if let Some(url) = read_env("SITEAUDITOR_DOH_URL") {
            builder = builder.doh_url(url);
        }

        builder.build()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

fn read_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_timeout(mut self, timeout: u64) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn probe_timeout(mut self, timeout: u64) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn resource_timeout(mut self, timeout: u64) -> Self {
        self.config.resource_timeout = timeout;
        self
    }

    pub fn ssl_timeout(mut self, timeout: u64) -> Self {
        self.config.ssl_timeout = timeout;
        self
    }

    pub fn render_timeout(mut self, timeout: u64) -> Self {
        self.config.render_timeout = timeout;
        self
    }

    pub fn pagespeed_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.pagespeed_api_key = Some(key.into());
        self
    }

    pub fn pagespeed_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.pagespeed_api_url = url.into();
        self
    }

    pub fn wappalyzer_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.wappalyzer_api_key = Some(key.into());
        self
    }

    pub fn wappalyzer_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.wappalyzer_api_url = url.into();
        self
    }

    pub fn doh_url(mut self, url: impl Into<String>) -> Self {
        self.config.doh_url = url.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn link_concurrency(mut self, n: usize) -> Self {
        self.config.link_concurrency = n.max(1);
        self
    }

    pub fn resource_concurrency(mut self, n: usize) -> Self {
        self.config.resource_concurrency = n.max(1);
        self
    }

    pub fn max_links(mut self, n: usize) -> Self {
        self.config.max_links = n;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
