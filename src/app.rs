//! 应用生命周期
//!
//! 初始化（凭证、暂存目录、推理客户端）→ 运行（监听、清扫、优雅退出）

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::config::Config;
use crate::services::LlmService;
use crate::utils::logging::log_startup;

/// 应用主结构
pub struct App {
    state: AppState,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let client = Arc::new(LlmService::new(&config));
        let state = AppState::new(config, client);

        state
            .staging
            .ensure_dir()
            .await
            .context("无法创建暂存目录")?;

        Ok(Self { state })
    }

    /// 运行 HTTP 服务，直到收到退出信号
    pub async fn run(self) -> Result<()> {
        let config = self.state.config.clone();
        let addr = format!("{}:{}", config.host, config.port);

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法监听 {}", addr))?;

        let sweeper = self
            .state
            .staging
            .spawn_sweeper(config.stale_upload_max_age, config.sweep_interval);

        info!("✓ 服务已启动: http://{}", addr);

        axum::serve(listener, api::router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        sweeper.abort();
        info!("👋 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在停止服务...");
}
