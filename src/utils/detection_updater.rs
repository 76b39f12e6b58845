//! 检测结果更新工具
//! 同一技术多条规则命中时取最高置信度，版本只来自取得最高置信度的那条规则

use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// 单技术的当前最佳命中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionHit {
    pub confidence: u8,
    pub version: Option<String>,
}

/// 检测结果更新工具
pub struct DetectionUpdater;

impl DetectionUpdater {
    /// 记录一次规则命中
    /// 置信度严格更高才替换（并列时保留先命中的规则及其版本）
    pub fn update(
        detected: &mut HashMap<String, DetectionHit>,
        tech_name: &str,
        confidence: u8,
        version: Option<String>,
    ) {
        let confidence = confidence.min(100);

        match detected.entry(tech_name.to_string()) {
            Entry::Occupied(mut entry) => {
                let hit = entry.get_mut();
                if confidence > hit.confidence {
                    hit.confidence = confidence;
                    hit.version = version;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(DetectionHit { confidence, version });
            }
        }
    }
}
