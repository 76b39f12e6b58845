//! 页面提取模块

pub mod html_extractor;

pub use self::html_extractor::{Anchor, HtmlExtractor, ImageTag, MetaTag, PageDocument};
