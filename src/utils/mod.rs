//! 工具模块

pub mod detection_updater;
pub mod header_converter;
pub mod version_extractor;

pub use self::detection_updater::{DetectionHit, DetectionUpdater};
pub use self::header_converter::HeaderConverter;
pub use self::version_extractor::VersionExtractor;
