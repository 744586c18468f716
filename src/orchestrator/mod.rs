//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文件处理器
//! - 对本次上传的所有文件扇出 `AnalysisFlow`
//! - 等待全部结束（不短路），保持输入顺序
//!
//! ### `aggregator` - 响应汇总
//! - 统计成功数量，生成 `AggregateResponse`
//!
//! ## 层次关系
//!
//! ```text
//! api (上传接收 + HTTP)
//!     ↓
//! batch_processor (处理 Vec<UploadedFile>)
//!     ↓
//! workflow::AnalysisFlow (处理单个文件)
//!     ↓
//! services (能力层：inference / parser)
//!     ↓
//! infrastructure (基础设施：StagingArea)
//! ```

pub mod aggregator;
pub mod batch_processor;

pub use aggregator::aggregate;
pub use batch_processor::BatchProcessor;
