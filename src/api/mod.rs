//! API 模块
//!
//! 负责 HTTP 接口：上传接收、路由和错误响应

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
