//! 上传接收
//!
//! 从 multipart 请求中取出图片，先全部校验，再写入暂存目录。
//! 任何一个文件不合格都会让整个请求失败，且不会留下暂存文件。

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::config::Config;
use crate::infrastructure::StagingArea;
use crate::models::UploadedFile;

/// 承载图片的表单字段名
pub const FILE_FIELD: &str = "images";

/// 已通过校验、尚未写入磁盘的文件
#[derive(Debug)]
struct PendingFile {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

/// 接收、校验并暂存本次请求的所有图片
pub async fn receive_files(
    multipart: Multipart,
    config: &Config,
    staging: &StagingArea,
) -> Result<Vec<UploadedFile>, ApiError> {
    let pending = collect_files(multipart, config).await?;
    if pending.is_empty() {
        return Err(ApiError::NoFiles);
    }

    let mut staged = Vec::with_capacity(pending.len());
    for file in pending {
        match staging.stage(&file.name, &file.mime_type, &file.data).await {
            Ok(uploaded) => staged.push(uploaded),
            Err(e) => {
                // 已写入的文件立即回收
                for done in &staged {
                    if let Err(cleanup_err) = StagingArea::remove(&done.staged_path).await {
                        warn!("回收暂存文件失败: {}", cleanup_err);
                    }
                }
                return Err(e.into());
            }
        }
    }

    Ok(staged)
}

async fn collect_files(
    mut multipart: Multipart,
    config: &Config,
) -> Result<Vec<PendingFile>, ApiError> {
    let mut pending = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, config))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // 没有文件名的部分不是文件（例如浏览器提交的空选择框）
        let Some(name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string) else {
            continue;
        };

        if pending.len() >= config.max_files {
            return Err(ApiError::TooManyFiles {
                max: config.max_files,
            });
        }

        let mime_type = normalize_mime_type(field.content_type().unwrap_or_default());
        validate_content_type(&mime_type, &config.allowed_mime_types)?;

        // 边读边检查，超过上限立即停止
        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, config))?
        {
            if data.len() + chunk.len() > config.max_file_size {
                return Err(file_too_large(config));
            }
            data.extend_from_slice(&chunk);
        }

        debug!("收到文件 {} ({}, {} 字节)", name, mime_type, data.len());
        pending.push(PendingFile {
            name,
            mime_type,
            data,
        });
    }

    Ok(pending)
}

/// 去掉 MIME 参数并转小写（"image/JPEG; q=1" -> "image/jpeg"）
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// 校验 MIME 类型是否在白名单中
pub fn validate_content_type(mime_type: &str, allowed: &[String]) -> Result<(), ApiError> {
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(mime_type)) {
        Ok(())
    } else {
        Err(ApiError::InvalidFileType {
            mime: if mime_type.is_empty() {
                "unknown".to_string()
            } else {
                mime_type.to_string()
            },
            allowed: allowed.join(", "),
        })
    }
}

fn file_too_large(config: &Config) -> ApiError {
    ApiError::FileTooLarge {
        max_mb: config.max_file_size / 1024 / 1024,
    }
}

/// 请求体超过上限时按文件过大处理，其余视为格式错误
fn multipart_error(err: MultipartError, config: &Config) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        file_too_large(config)
    } else {
        ApiError::InvalidUpload(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("image/JPEG; charset=binary"), "image/jpeg");
        assert_eq!(normalize_mime_type(" image/png "), "image/png");
        assert_eq!(normalize_mime_type(""), "");
    }

    #[test]
    fn test_validate_content_type() {
        let allowed = Config::default().allowed_mime_types;
        assert!(validate_content_type("image/webp", &allowed).is_ok());
        assert!(validate_content_type("image/gif", &allowed).is_ok());

        match validate_content_type("application/pdf", &allowed) {
            Err(ApiError::InvalidFileType { mime, allowed }) => {
                assert_eq!(mime, "application/pdf");
                assert!(allowed.contains("image/png"));
            }
            other => panic!("意外结果: {:?}", other),
        }
        assert!(matches!(
            validate_content_type("", &allowed),
            Err(ApiError::InvalidFileType { .. })
        ));
    }
}
