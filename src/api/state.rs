use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::infrastructure::StagingArea;
use crate::orchestrator::BatchProcessor;
use crate::services::InferenceClient;
use crate::workflow::AnalysisFlow;

/// 请求处理共享状态（只读）
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub staging: StagingArea,
    pub processor: BatchProcessor,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, client: Arc<dyn InferenceClient>) -> Self {
        let staging = StagingArea::new(config.upload_dir.clone());
        let flow = AnalysisFlow::new(&config, client, staging.clone());

        Self {
            config: Arc::new(config),
            staging,
            processor: BatchProcessor::new(flow),
            started_at: Instant::now(),
        }
    }
}
