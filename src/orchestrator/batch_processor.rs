//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 对一次上传中的所有文件并发执行 `AnalysisFlow`，等待全部结束后按输入顺序返回结果。
//!
//! ## 设计特点
//!
//! - **扇出/扇入**：`join_all` 在当前请求任务内并发推进所有分析，不提前短路
//! - **顺序保持**：结果顺序与输入顺序一致，与完成顺序无关
//! - **失败隔离**：单个文件失败只体现在它自己的 `FileOutcome` 中

use futures::future::join_all;

use crate::models::{AggregateResponse, FileOutcome, UploadedFile};
use crate::orchestrator::aggregator;
use crate::utils::logging::{log_batch_complete, log_batch_start};
use crate::workflow::{AnalysisCtx, AnalysisFlow};

/// 批量处理器
#[derive(Clone)]
pub struct BatchProcessor {
    flow: AnalysisFlow,
}

impl BatchProcessor {
    pub fn new(flow: AnalysisFlow) -> Self {
        Self { flow }
    }

    /// 并发分析所有文件，结果顺序与输入一致
    pub async fn analyze_all(&self, files: &[UploadedFile]) -> Vec<FileOutcome> {
        let total = files.len();
        let tasks = files.iter().enumerate().map(|(idx, file)| {
            let ctx = AnalysisCtx::new(idx + 1, total, &file.original_name);
            async move { self.flow.run(file, &ctx).await }
        });

        join_all(tasks).await
    }

    /// 分析并汇总为最终响应
    pub async fn process(&self, files: &[UploadedFile]) -> AggregateResponse {
        log_batch_start(files.len());

        let outcomes = self.analyze_all(files).await;
        let response = aggregator::aggregate(outcomes);

        log_batch_complete(response.successful_analyses, response.total_files);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infrastructure::StagingArea;
    use crate::services::InferenceClient;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// 按文件内容决定行为的脚本化推理客户端
    ///
    /// - `fail:<msg>` → 返回错误
    /// - `slow:<ms>:<skin>` → 延迟后返回
    /// - `hang` → 永不返回
    /// - 其他 → 把内容当作肤质返回合法 JSON
    struct ScriptedClient;

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn analyze_image(&self, _: &str, _: &str, base64_data: &str) -> Result<String> {
            use base64::Engine;
            let bytes = base64::engine::general_purpose::STANDARD.decode(base64_data)?;
            let script = String::from_utf8(bytes)?;

            if let Some(msg) = script.strip_prefix("fail:") {
                bail!("{}", msg);
            }
            if script == "hang" {
                futures::future::pending::<()>().await;
            }
            let skin = match script.strip_prefix("slow:") {
                Some(rest) => {
                    let (ms, skin) = rest.split_once(':').unwrap_or((rest, "normal"));
                    tokio::time::sleep(Duration::from_millis(ms.parse().unwrap_or(0))).await;
                    skin.to_string()
                }
                None => script,
            };
            Ok(format!(
                "```json\n{{\"skin_type\":\"{}\",\"overall_condition\":\"ok\"}}\n```",
                skin
            ))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    async fn setup(
        dir: &std::path::Path,
        scripts: &[&str],
    ) -> (BatchProcessor, Vec<UploadedFile>) {
        let config = Config {
            inference_timeout: Duration::from_millis(200),
            cleanup_delay: Duration::from_millis(10),
            ..Config::default()
        };
        let staging = StagingArea::new(dir);
        let flow = AnalysisFlow::new(&config, Arc::new(ScriptedClient), staging.clone());

        let mut files = Vec::new();
        for (i, script) in scripts.iter().enumerate() {
            let name = format!("img{}.png", i);
            files.push(staging.stage(&name, "image/png", script.as_bytes()).await.unwrap());
        }
        (BatchProcessor::new(flow), files)
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, files) =
            setup(dir.path(), &["slow:80:oily", "slow:1:dry", "slow:40:normal"]).await;

        let outcomes = processor.analyze_all(&files).await;

        let skins: Vec<_> = outcomes
            .iter()
            .map(|o| o.analysis.as_ref().unwrap().skin_type.as_str())
            .collect();
        assert_eq!(skins, vec!["oily", "dry", "normal"]);
        let names: Vec<_> = outcomes.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(names, vec!["img0.png", "img1.png", "img2.png"]);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, files) = setup(dir.path(), &["oily", "fail:upstream 503", "dry"]).await;

        let response = processor.process(&files).await;

        assert!(response.success);
        assert_eq!(response.total_files, 3);
        assert_eq!(response.successful_analyses, 2);
        assert!(response.results[0].success);
        assert!(!response.results[1].success);
        assert!(response.results[1].analysis.is_none());
        assert!(response.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("upstream 503"));
        assert_eq!(
            response.results[2].analysis.as_ref().unwrap().skin_type,
            "dry"
        );
    }

    #[tokio::test]
    async fn test_hanging_call_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, files) = setup(dir.path(), &["hang", "oily"]).await;

        let outcomes = processor.analyze_all(&files).await;

        assert!(!outcomes[0].success);
        assert!(outcomes[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("inference timed out after 0s"));
        assert!(outcomes[1].success);
    }

    #[tokio::test]
    async fn test_missing_staged_file_is_per_file_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, files) = setup(dir.path(), &["oily", "dry"]).await;
        std::fs::remove_file(&files[0].staged_path).unwrap();

        let outcomes = processor.analyze_all(&files).await;

        assert!(!outcomes[0].success);
        let message = outcomes[0].error.as_deref().unwrap();
        assert_eq!(message, "uploaded file could not be read for analysis");
        assert!(!message.contains(&*dir.path().to_string_lossy()));
        assert!(outcomes[1].success);
    }

    #[tokio::test]
    async fn test_staged_files_removed_after_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, files) = setup(dir.path(), &["oily", "fail:boom"]).await;

        processor.analyze_all(&files).await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        for file in &files {
            assert!(!file.staged_path.exists(), "{:?} 应已删除", file.staged_path);
        }
    }
}
