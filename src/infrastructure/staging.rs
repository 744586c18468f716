//! 暂存目录 - 基础设施层
//!
//! 持有上传文件的暂存目录，只暴露"写入 / 读取 / 删除 / 清扫"能力

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, FileError};
use crate::models::UploadedFile;

const MAX_SANITIZED_LEN: usize = 100;

/// 上传文件暂存区
///
/// 职责：
/// - 按需创建暂存目录
/// - 以"毫秒时间戳-随机后缀-清洗后文件名"写入文件，同名文件互不覆盖
/// - 延迟删除和过期清扫
/// - 不认识分析结果
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 确保暂存目录存在
    pub async fn ensure_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::dir_create_failed(self.dir.display().to_string(), e))
    }

    /// 写入一个已通过校验的文件
    pub async fn stage(
        &self,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> AppResult<UploadedFile> {
        self.ensure_dir().await?;

        let staged_path = self.dir.join(staged_file_name(original_name));
        let mut out = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staged_path)
            .await
            .map_err(|e| AppError::file_write_failed(staged_path.display().to_string(), e))?;
        out.write_all(data)
            .await
            .map_err(|e| AppError::file_write_failed(staged_path.display().to_string(), e))?;
        out.flush()
            .await
            .map_err(|e| AppError::file_write_failed(staged_path.display().to_string(), e))?;

        debug!(
            "已暂存 {} -> {} ({} 字节)",
            original_name,
            staged_path.display(),
            data.len()
        );

        Ok(UploadedFile {
            original_name: original_name.to_string(),
            staged_path,
            declared_mime_type: mime_type.to_string(),
            size_bytes: data.len(),
        })
    }

    /// 读取暂存文件内容
    pub async fn read(&self, file: &UploadedFile) -> AppResult<Vec<u8>> {
        fs::read(&file.staged_path)
            .await
            .map_err(|e| AppError::file_read_failed(file.staged_path.display().to_string(), e))
    }

    /// 立即删除暂存文件
    pub async fn remove(path: &Path) -> AppResult<()> {
        fs::remove_file(path).await.map_err(|e| {
            FileError::DeleteFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            }
            .into()
        })
    }

    /// 延迟删除暂存文件
    ///
    /// 后台执行，不阻塞调用方；删除失败只记日志。
    pub fn schedule_removal(&self, path: PathBuf, delay: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match Self::remove(&path).await {
                Ok(()) => debug!("🧹 已删除暂存文件: {}", path.display()),
                Err(e) => warn!("暂存文件删除失败: {}", e),
            }
        })
    }

    /// 删除修改时间早于 `max_age` 的暂存文件，返回删除数量
    pub async fn sweep_stale(&self, max_age: Duration) -> AppResult<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(AppError::file_read_failed(self.dir.display().to_string(), e));
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::file_read_failed(self.dir.display().to_string(), e))?
        {
            let path = entry.path();
            let modified = match entry.metadata().await.and_then(|m| {
                if m.is_file() {
                    m.modified().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(modified)) => modified,
                Ok(None) => continue,
                Err(e) => {
                    warn!("无法读取文件信息 {}: {}", path.display(), e);
                    continue;
                }
            };

            let age = now.duration_since(modified).unwrap_or_default();
            if age < max_age {
                continue;
            }

            match Self::remove(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("过期文件删除失败: {}", e),
            }
        }

        Ok(removed)
    }

    /// 启动周期性清扫任务（启动时立即执行一次）
    pub fn spawn_sweeper(&self, max_age: Duration, interval: Duration) -> JoinHandle<()> {
        let staging = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
            loop {
                ticker.tick().await;
                match staging.sweep_stale(max_age).await {
                    Ok(0) => {}
                    Ok(n) => info!("🧹 清扫了 {} 个过期暂存文件", n),
                    Err(e) => warn!("暂存目录清扫失败: {}", e),
                }
            }
        })
    }
}

/// 生成暂存文件名：`<毫秒时间戳>-<8位随机十六进制>-<清洗后文件名>`
///
/// 同一请求里的同名文件会在同一毫秒内写入，随机段保证路径不同。
pub fn staged_file_name(original_name: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        &token[..8],
        sanitize_filename(original_name)
    )
}

/// 清洗文件名：除字母、数字和 `.` 以外的字符都替换为 `_`
///
/// 路径分隔符也会被替换，结果永远只是单个文件名。
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .take(MAX_SANITIZED_LEN)
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect();

    if sanitized.trim_matches(|c| c == '.' || c == '_').is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}
