//! 响应汇总

use chrono::Utc;

use crate::models::{AggregateResponse, FileOutcome};

/// 汇总所有文件结果
///
/// 批次本身走完即视为成功，单个文件失败不影响整体 `success`。
/// 时间戳在汇总时统一取一次。
pub fn aggregate(results: Vec<FileOutcome>) -> AggregateResponse {
    let successful_analyses = results.iter().filter(|r| r.success).count();

    AggregateResponse {
        success: true,
        timestamp: Utc::now(),
        total_files: results.len(),
        successful_analyses,
        results,
    }
}
