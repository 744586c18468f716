use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;

/// 构建路由
///
/// 请求体上限按"文件数 × 单文件上限"放宽，具体的单文件校验交给上传接收层。
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.request_body_limit();

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/status", get(handlers::status))
        .route("/api/analyze", post(handlers::analyze))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
