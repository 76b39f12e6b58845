//! 扫描结果数据模型

pub mod common;
pub mod dns;
pub mod gdpr;
pub mod green;
pub mod links;
pub mod report;
pub mod security;
pub mod seo;
pub mod social;
pub mod tech;

pub use self::common::{Dimension, DimensionResult, Severity, clamp_score};
pub use self::dns::{DkimInfo, DkimStatus, DmarcInfo, DnsHealthResult, RecordStatus, SpfInfo};
pub use self::gdpr::{CookieCategory, CookieItem, GdprResult, RawCookie};
pub use self::green::GreenResult;
pub use self::links::{BrokenLink, BrokenLinksResult, LinkErrorType};
pub use self::report::{AnalysisResult, DimensionReport, ScanStatus, Winner};
pub use self::security::{ExposedFileFinding, SecurityHeaderFinding, SecurityResult, SslInfo};
pub use self::seo::{AuditItem, CoreWebVitals, LighthouseScores, SeoResult};
pub use self::social::{ImageStatus, SocialPreviewResult};
pub use self::tech::{CompanyInfo, ContactInfo, DetectedTechnology, TechSource, TechStackResult};
