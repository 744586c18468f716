/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug 或 info。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "skin_analyzer=debug,tower_http=debug,info"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 皮肤分析服务启动 - {}:{}", config.host, config.port);
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    info!(
        "📦 上传限制: 每次最多 {} 个文件, 单个 {} MB",
        config.max_files,
        config.max_file_size / 1024 / 1024
    );
    info!("📁 暂存目录: {}", config.upload_dir.display());
    info!("⏱️ 推理超时: {} 秒", config.inference_timeout.as_secs());
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize) {
    info!("{}", "─".repeat(60));
    info!("📦 开始分析本次上传: 共 {} 个文件", total);
}

/// 记录批次完成信息
pub fn log_batch_complete(success: usize, total: usize) {
    info!("✓ 本次上传分析完成: 成功 {}/{}", success, total);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("油性皮肤分析", 2), "油性...");
    }
}
