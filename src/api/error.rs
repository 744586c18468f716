//! HTTP 错误响应
//!
//! 所有错误统一渲染为 `{success: false, error, code}`。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

/// 接口层错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No files uploaded")]
    NoFiles,

    #[error("File too large. Maximum size is {max_mb}MB")]
    FileTooLarge { max_mb: usize },

    #[error("Too many files. Maximum is {max} files per request")]
    TooManyFiles { max: usize },

    #[error("Invalid file type '{mime}'. Allowed types: {allowed}")]
    InvalidFileType { mime: String, allowed: String },

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Endpoint not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFiles
            | ApiError::FileTooLarge { .. }
            | ApiError::TooManyFiles { .. }
            | ApiError::InvalidFileType { .. }
            | ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 稳定的机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NoFiles => "NO_FILES",
            ApiError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ApiError::TooManyFiles { .. } => "TOO_MANY_FILES",
            ApiError::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            ApiError::InvalidUpload(_) => "INVALID_UPLOAD",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 内部错误只记录日志，不把细节返回给调用方
        let message = match &self {
            ApiError::Internal(e) => {
                error!("❌ 请求处理失败: {}", e);
                "Internal server error".to_string()
            }
            ApiError::NotFound => self.to_string(),
            other => {
                warn!("请求被拒绝 ({}): {}", other.code(), other);
                other.to_string()
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}
