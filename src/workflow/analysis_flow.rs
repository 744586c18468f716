//! 文件分析流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整分析流程
//!
//! 流程顺序：
//! 1. 读取暂存文件 → base64
//! 2. 调用推理服务（带超时）
//! 3. 结果解析（失败时使用兜底结果）
//! 4. 安排延迟删除暂存文件（无论成败）

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use base64::Engine;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::infrastructure::StagingArea;
use crate::models::{FileOutcome, UploadedFile};
use crate::services::{parse_analysis, InferenceClient, ANALYSIS_PROMPT};
use crate::utils::logging::truncate_text;
use crate::workflow::analysis_ctx::AnalysisCtx;

const STAGED_READ_FAILED: &str = "uploaded file could not be read for analysis";

/// 文件分析流程
///
/// - 编排单个文件的分析流程
/// - 任何失败都转换为失败的 `FileOutcome`，不向外抛错
/// - 只依赖业务能力（services）和暂存区
#[derive(Clone)]
pub struct AnalysisFlow {
    client: Arc<dyn InferenceClient>,
    staging: StagingArea,
    inference_timeout: Duration,
    cleanup_delay: Duration,
}

impl AnalysisFlow {
    pub fn new(config: &Config, client: Arc<dyn InferenceClient>, staging: StagingArea) -> Self {
        Self {
            client,
            staging,
            inference_timeout: config.inference_timeout,
            cleanup_delay: config.cleanup_delay,
        }
    }

    /// 分析单个文件，总是返回一个 `FileOutcome`
    pub async fn run(&self, file: &UploadedFile, ctx: &AnalysisCtx) -> FileOutcome {
        info!("{} 🔍 开始分析 ({} 字节)", ctx, file.size_bytes);

        let outcome = match self.analyze(file, ctx).await {
            Ok(analysis) => {
                if analysis.is_fallback() {
                    warn!("{} ⚠️ 模型输出无法解析，返回兜底结果", ctx);
                } else {
                    info!("{} ✓ 分析完成，肤质: {}", ctx, analysis.skin_type);
                }
                FileOutcome::succeeded(&file.original_name, analysis)
            }
            Err(e) => {
                error!("{} ❌ 分析失败: {}", ctx, e);
                FileOutcome::failed(&file.original_name, e.to_string())
            }
        };

        self.staging
            .schedule_removal(file.staged_path.clone(), self.cleanup_delay);

        outcome
    }

    async fn analyze(
        &self,
        file: &UploadedFile,
        ctx: &AnalysisCtx,
    ) -> Result<crate::models::AnalysisRecord> {
        // 暂存路径只进日志，不进返回给调用方的错误信息
        let bytes = self.staging.read(file).await.map_err(|e| {
            error!("{} 读取暂存文件失败: {}", ctx, e);
            anyhow!(STAGED_READ_FAILED)
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let call = self
            .client
            .analyze_image(ANALYSIS_PROMPT, &file.declared_mime_type, &encoded);

        let raw = match tokio::time::timeout(self.inference_timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(anyhow!(LlmError::Timeout {
                    model: self.client.model_name().to_string(),
                    seconds: self.inference_timeout.as_secs(),
                }));
            }
        };

        info!("{} 模型响应: {}", ctx, truncate_text(&raw, 80));

        Ok(parse_analysis(&raw))
    }
}
