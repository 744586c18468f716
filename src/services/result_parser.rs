//! 结果解析 - 业务能力层
//!
//! 把模型返回的文本转换为 `AnalysisRecord`，任何失败都落到固定兜底结果，不向外抛错。

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::models::AnalysisRecord;
use crate::utils::logging::truncate_text;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json[^\S\n]*\n?(.*?)```").expect("valid regex"));

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[^\S\n]*\n?(.*?)```").expect("valid regex"));

/// 解析模型输出
///
/// 1. 去掉首尾空白
/// 2. 如果包含 ``` 代码块，优先取第一个 ```json 块，否则取第一个代码块
/// 3. 按 JSON 解析，并要求 `skin_type` / `overall_condition` 非空
///
/// 任一步失败都返回 [`AnalysisRecord::fallback`]。
pub fn parse_analysis(raw: &str) -> AnalysisRecord {
    let payload = extract_payload(raw);

    match serde_json::from_str::<AnalysisRecord>(payload) {
        Ok(record) if record.is_complete() => {
            debug!("模型输出解析成功，肤质: {}", record.skin_type);
            record
        }
        Ok(_) => {
            warn!("模型输出缺少 skin_type 或 overall_condition，使用兜底结果");
            AnalysisRecord::fallback()
        }
        Err(e) => {
            warn!(
                "模型输出无法解析为 JSON: {} | 内容: {}",
                e,
                truncate_text(payload, 120)
            );
            AnalysisRecord::fallback()
        }
    }
}

/// 剥掉模型可能添加的 markdown 代码块包装
fn extract_payload(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.contains("```") {
        return trimmed;
    }

    JSON_FENCE
        .captures(trimmed)
        .or_else(|| ANY_FENCE.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}
