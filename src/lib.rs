//! # Skin Analyzer
//!
//! 一个接收皮肤照片、交给多模态模型分析并返回结构化结果的 HTTP 服务
//!
//! ## 架构设计
//!
//! 本系统沿用四层架构，外加一层 HTTP 接口：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有暂存目录，只暴露写入 / 读取 / 删除 / 清扫能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件
//! - `LlmService` - 多模态推理能力（`InferenceClient` 的实现）
//! - `result_parser` - 模型输出解析能力（带兜底）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整分析流程
//! - `AnalysisCtx` - 上下文封装（第几个文件 / 文件名）
//! - `AnalysisFlow` - 流程编排（读取 → 推理 → 解析 → 延迟清理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 扇出/扇入，保持输入顺序
//! - `orchestrator/aggregator` - 汇总统计
//!
//! ### ⑤ 接口层（API）
//! - `api/` - 上传接收、路由、错误响应
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use api::{router, AppState};
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::StagingArea;
pub use models::{AggregateResponse, AnalysisRecord, FileOutcome, UploadedFile};
pub use orchestrator::BatchProcessor;
pub use services::{InferenceClient, LlmService};
pub use workflow::{AnalysisCtx, AnalysisFlow};
