use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 皮肤分析结果
///
/// 字段名与模型返回的 JSON 保持一致（snake_case）。
/// 模型额外返回的字段保存在 `extra` 中并原样输出。
/// 除 `skin_type` / `overall_condition` 外都是可选的，缺失或 `null` 取默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// 解析失败时的兜底标记
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skin_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_condition: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detected_conditions: Vec<DetectedCondition>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_products: Vec<ProductRecommendation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personalized_advice: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// 检测到的皮肤状况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedCondition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// 置信度，0.0 ~ 1.0；保留模型给出的原始值（`1` 不会变成 `1.0`）
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub confidence: JsonValue,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// mild / moderate / severe
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// 推荐产品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// `null` 和缺失一样取默认值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl DetectedCondition {
    /// 数值形式的置信度；模型有时会把数字写成字符串
    pub fn confidence_score(&self) -> Option<f64> {
        match &self.confidence {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl AnalysisRecord {
    /// 最低限度的校验：肤质和整体状况都必须非空
    pub fn is_complete(&self) -> bool {
        !self.skin_type.trim().is_empty() && !self.overall_condition.trim().is_empty()
    }

    /// 模型输出无法解析时使用的固定兜底结果
    pub fn fallback() -> Self {
        Self {
            error: Some("Failed to parse AI response".to_string()),
            skin_type: "unknown".to_string(),
            overall_condition: "Unable to determine".to_string(),
            detected_conditions: Vec::new(),
            recommended_products: vec![ProductRecommendation {
                category: "cleanser".to_string(),
                recommendation: "Use a gentle, fragrance-free cleanser twice daily".to_string(),
                ingredients: vec!["gentle surfactants".to_string()],
                extra: Map::new(),
            }],
            personalized_advice: "We could not analyze this image reliably. Please upload a clearer, well-lit photo of the affected skin area and try again.".to_string(),
            extra: Map::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}
