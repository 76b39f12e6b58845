//! 全局分数聚合
//! 缺失（None）的分类被剔除并重新分配权重；存在但为 0 的分类照常参与

use crate::model::AnalysisResult;

pub const WEIGHT_PERFORMANCE: f64 = 0.20;
pub const WEIGHT_SEO: f64 = 0.20;
pub const WEIGHT_SECURITY: f64 = 0.20;
pub const WEIGHT_ACCESSIBILITY: f64 = 0.15;
pub const WEIGHT_BEST_PRACTICES: f64 = 0.10;
pub const WEIGHT_GDPR: f64 = 0.15;
pub const WEIGHT_GREEN_IT: f64 = 0.10;

fn weighted_categories(result: &AnalysisResult) -> [(Option<u8>, f64); 7] {
    let scores = &result.seo.scores;
    [
        (scores.performance, WEIGHT_PERFORMANCE),
        (scores.seo, WEIGHT_SEO),
        (Some(result.security.score), WEIGHT_SECURITY),
        (scores.accessibility, WEIGHT_ACCESSIBILITY),
        (scores.best_practices, WEIGHT_BEST_PRACTICES),
        (Some(result.gdpr.score), WEIGHT_GDPR),
        (Some(result.green_it.score), WEIGHT_GREEN_IT),
    ]
}

/// 只读计算，不修改结果
pub fn weighted_score(result: &AnalysisResult) -> u8 {
    let (sum, total_weight) = weighted_categories(result)
        .iter()
        .filter_map(|(score, weight)| score.map(|s| (f64::from(s), *weight)))
        .fold((0.0, 0.0), |(sum, total), (score, weight)| (sum + score * weight, total + weight));

    if total_weight <= 0.0 {
        return 0;
    }
    // 与银行家舍入一致：.5 向偶数取整
    (sum / total_weight).round_ties_even().clamp(0.0, 100.0) as u8
}

/// 计算并写回 global_score
pub fn compute_global_score(result: &mut AnalysisResult) -> u8 {
    let score = weighted_score(result);
    result.global_score = score;
    score
}
