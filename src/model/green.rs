//! 碳足迹维度结果模型

use serde::{Deserialize, Serialize};

use super::common::{Dimension, impl_dimension_result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenResult {
    pub co2_grams: f64,
    /// A-G，未计算时为 Unknown
    pub grade: String,
    pub total_size_mb: f64,
    pub resource_count: usize,
    pub score: u8,
    pub error: Option<String>,
}

impl Default for GreenResult {
    fn default() -> Self {
        Self {
            co2_grams: 0.0,
            grade: "Unknown".to_string(),
            total_size_mb: 0.0,
            resource_count: 0,
            score: 0,
            error: None,
        }
    }
}

impl_dimension_result!(GreenResult, Dimension::GreenIt);
