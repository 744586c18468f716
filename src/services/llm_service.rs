//! LLM 服务 - 业务能力层
//!
//! 只负责"把一张图片交给多模态模型"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini 的 OpenAI 兼容端点）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, LlmError};

/// 固定的分析指令，要求模型只返回一个 JSON 对象
pub const ANALYSIS_PROMPT: &str = r#"You are a dermatology assistant. Analyze the skin shown in this image.

Respond with exactly one JSON object and nothing else, using this schema:
{
  "skin_type": "oily | dry | combination | normal | sensitive",
  "overall_condition": "short summary of the overall skin condition",
  "detected_conditions": [
    {
      "name": "condition name",
      "confidence": 0.0,
      "description": "what was observed",
      "severity": "mild | moderate | severe"
    }
  ],
  "recommended_products": [
    {
      "category": "cleanser | moisturizer | serum | sunscreen | treatment",
      "recommendation": "specific product guidance",
      "ingredients": ["ingredient"]
    }
  ],
  "personalized_advice": "free-text skincare advice"
}

Rules:
- "confidence" is a number between 0 and 1.
- Use an empty array when no conditions are detected.
- Do not wrap the JSON in markdown and do not add any commentary."#;

const SYSTEM_MESSAGE: &str = "You are a careful skincare analysis assistant. You describe visible skin characteristics and never give a medical diagnosis.";

/// 推理服务抽象
///
/// 生产环境由 [`LlmService`] 实现；测试中可替换为脚本化实现。
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// 发送指令和一张 base64 图片，返回模型的原始文本
    async fn analyze_image(
        &self,
        instruction: &str,
        mime_type: &str,
        base64_data: &str,
    ) -> Result<String>;

    /// 模型名称（仅用于日志和错误信息）
    fn model_name(&self) -> &str;
}

/// LLM 服务
///
/// 职责：
/// - 调用多模态 LLM API 分析单张图片
/// - 只处理单个文件
/// - 不解析结果、不关心暂存文件
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的多模态调用
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `image_url`: 图片地址，可以是 `data:` URL
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        image_url: &str,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        // 文本 + 图片组成一条用户消息
        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: image_url.to_string(),
                        detail: Some(ImageDetail::High),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.2)
            .max_tokens(2048u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AppError::from(LlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl InferenceClient for LlmService {
    async fn analyze_image(
        &self,
        instruction: &str,
        mime_type: &str,
        base64_data: &str,
    ) -> Result<String> {
        let data_url = format!("data:{};base64,{}", mime_type, base64_data);
        self.send_to_llm(instruction, Some(SYSTEM_MESSAGE), &data_url)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    /// 创建测试用的 LlmService（读取环境变量中的真实凭证）
    fn create_test_service() -> LlmService {
        let mut config = Config::default();
        config.llm_api_key = std::env::var("LLM_API_KEY").unwrap_or_default();
        if let Ok(base) = std::env::var("LLM_API_BASE_URL") {
            config.llm_api_base_url = base;
        }
        LlmService::new(&config)
    }

    #[test]
    fn test_prompt_names_every_field() {
        for field in [
            "skin_type",
            "overall_condition",
            "detected_conditions",
            "confidence",
            "severity",
            "recommended_products",
            "ingredients",
            "personalized_advice",
        ] {
            assert!(ANALYSIS_PROMPT.contains(field), "提示词缺少字段 {}", field);
        }
    }

    #[test]
    fn test_model_name_from_config() {
        let service = create_test_service();
        assert_eq!(service.model_name(), Config::default().llm_model_name);
    }

    /// 测试真实 Vision API（需要 LLM_API_KEY）
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_vision_api -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_vision_api() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = create_test_service();

        // 1x1 PNG
        let png: [u8; 67] = [
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ];
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);

        match service
            .analyze_image(ANALYSIS_PROMPT, "image/png", &encoded)
            .await
        {
            Ok(response) => {
                println!("\n========== LLM 响应 ==========");
                println!("{}", response);
                println!("==============================\n");
                assert!(!response.is_empty());
            }
            Err(e) => panic!("Vision API 测试失败: {}", e),
        }
    }
}
