use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use tracing::{info, instrument};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::upload::{receive_files, FILE_FIELD};
use crate::models::AggregateResponse;

const SERVICE_NAME: &str = "skin-analyzer";

/// POST /api/analyze
///
/// 非 multipart 请求视为没有上传文件。
#[instrument(skip_all, name = "analyze")]
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::NoFiles)?;

    let files = receive_files(multipart, &state.config, &state.staging).await?;
    info!("📥 收到 {} 个待分析文件", files.len());

    let response = state.processor.process(&files).await;
    Ok(Json(response))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<JsonValue> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "environment": state.config.environment,
        "api_key_configured": state.config.api_key_configured(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<JsonValue> {
    let config = &state.config;
    Json(json!({
        "success": true,
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "endpoints": {
            "analyze": {
                "method": "POST",
                "path": "/api/analyze",
                "content_type": "multipart/form-data",
                "field": FILE_FIELD,
                "description": "Analyze one or more skin images"
            },
            "health": { "method": "GET", "path": "/api/health" },
            "status": { "method": "GET", "path": "/api/status" }
        },
        "limits": {
            "max_files": config.max_files,
            "max_file_size_mb": config.max_file_size / 1024 / 1024,
            "allowed_mime_types": config.allowed_mime_types,
        },
        "model": config.llm_model_name,
    }))
}

/// GET /
pub async fn root() -> Json<JsonValue> {
    Json(json!({
        "success": true,
        "message": "Welcome to the skin analysis API",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/api/analyze", "/api/health", "/api/status"],
    }))
}

/// 未匹配的路由
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
