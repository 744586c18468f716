use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::analysis::AnalysisRecord;

/// 单个文件的分析结果
///
/// `success` 为 true 时只有 `analysis`，为 false 时只有 `error`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub filename: String,
    pub file_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(filename: impl Into<String>, analysis: AnalysisRecord) -> Self {
        Self {
            filename: filename.into(),
            file_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            success: true,
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            success: false,
            analysis: None,
            error: Some(error.into()),
        }
    }
}

/// 整个请求的汇总响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub total_files: usize,
    pub successful_analyses: usize,
    pub results: Vec<FileOutcome>,
}
