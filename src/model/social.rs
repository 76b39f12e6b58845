//! 社交分享预览维度结果模型

use serde::{Deserialize, Serialize};

use super::common::{Dimension, impl_dimension_result};

/// 分享图片可达性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Valid,
    Broken,
    #[default]
    Missing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialPreviewResult {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub site_name: Option<String>,
    pub twitter_card: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub twitter_image: Option<String>,
    pub image_status: ImageStatus,
    pub missing_tags: Vec<String>,
    pub score: u8,
    pub error: Option<String>,
}

impl_dimension_result!(SocialPreviewResult, Dimension::SocialPreview);
