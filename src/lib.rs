//! rsiteauditor - 多维度网站审计引擎
//! 安全、技术栈、失效链接、SEO、隐私合规、社交预览、碳足迹、邮件 DNS 八个维度并发分析，汇总为一个分数

// 导出全局错误类型
pub use self::error::{AuditError, AuditResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, GlobalConfig};

// 导出数据模型
pub use self::model::{AnalysisResult, Dimension, DimensionResult, ScanStatus, Severity, Winner};

// 导出提取模块核心接口
pub use self::extractor::{HtmlExtractor, PageDocument};

// 导出工具模块核心接口
pub use self::utils::{DetectionUpdater, HeaderConverter, VersionExtractor};

// 导出网络层核心接口
pub use self::net::{DohResolver, HttpProbe, ResponseHeaders, TlsInspector};

// 导出指纹引擎核心接口
pub use self::fingerprint::{SignatureCompiler, TECH_SIGNATURES, TechDetector};

// 导出分析器
pub use self::analyzer::{
    Analyzer, BrokenLinksAnalyzer, DnsHealthAnalyzer, GdprAnalyzer, GreenItAnalyzer, ScanContext, SecurityAnalyzer,
    SeoAnalyzer, SocialPreviewAnalyzer, TechStackAnalyzer,
};

// 导出扫描编排接口
pub use self::scanner::{
    HttpRenderer, NoRenderer, ProgressEvent, RenderedPage, Renderer, Scanner, StaticRenderer, compute_global_score,
    init_scanner, init_scanner_with_config, scan,
};

// 声明所有子模块
pub mod analyzer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod model;
pub mod net;
pub mod scanner;
pub mod utils;
