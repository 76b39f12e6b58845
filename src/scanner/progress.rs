//! 流式扫描进度事件（NDJSON）

use serde::{Deserialize, Serialize};

use crate::error::AuditResult;
use crate::model::AnalysisResult;

/// 固定步骤名；单个分析器完成时使用维度 key 作为步骤名
pub mod step {
    pub const INIT: &str = "init";
    pub const NETWORK: &str = "network";
    pub const RENDERING: &str = "rendering";
    pub const ANALYSIS: &str = "analysis";
    pub const FINALIZE: &str = "finalize";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Log { step: String, message: String },
    Error { message: String },
    Complete { data: Box<AnalysisResult> },
}

impl ProgressEvent {
    pub fn log(step: impl Into<String>, message: impl Into<String>) -> Self {
        ProgressEvent::Log {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }

    pub fn complete(result: AnalysisResult) -> Self {
        ProgressEvent::Complete { data: Box::new(result) }
    }

    /// 流的最后一个事件
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Log { .. })
    }

    pub fn step(&self) -> Option<&str> {
        match self {
            ProgressEvent::Log { step, .. } => Some(step),
            _ => None,
        }
    }

    /// 单行 JSON，不含换行符
    pub fn to_ndjson(&self) -> AuditResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
