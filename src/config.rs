use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppResult, ConfigError};

const MB: usize = 1024 * 1024;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 运行环境（仅用于健康检查展示）
    pub environment: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次推理调用超时
    pub inference_timeout: Duration,
    // --- 上传配置 ---
    /// 单个文件大小上限（字节）
    pub max_file_size: usize,
    /// 单次请求最多文件数
    pub max_files: usize,
    /// 允许的 MIME 类型
    pub allowed_mime_types: Vec<String>,
    /// 暂存目录
    pub upload_dir: PathBuf,
    /// 分析完成后延迟删除暂存文件
    pub cleanup_delay: Duration,
    /// 超过该时长的暂存文件会被清扫
    pub stale_upload_max_age: Duration,
    /// 清扫周期
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            environment: "development".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            inference_timeout: Duration::from_secs(60),
            max_file_size: 15 * MB,
            max_files: 5,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            upload_dir: PathBuf::from("uploads"),
            cleanup_delay: Duration::from_secs(5),
            stale_upload_max_age: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(600),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// `LLM_API_KEY` 缺失或为空时直接返回错误，服务不应在没有凭证的情况下启动。
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();

        let llm_api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            })?;

        let allowed_mime_types = match std::env::var("ALLOWED_MIME_TYPES") {
            Ok(raw) => parse_list(&raw),
            Err(_) => default.allowed_mime_types,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(default.host),
            port: env_parse("PORT", default.port)?,
            environment: std::env::var("APP_ENV").unwrap_or(default.environment),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging)?,
            llm_api_key,
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            inference_timeout: env_secs("INFERENCE_TIMEOUT_SECS", default.inference_timeout)?,
            max_file_size: env_megabytes("MAX_FILE_SIZE_MB", default.max_file_size)?,
            max_files: env_parse("MAX_FILES", default.max_files)?,
            allowed_mime_types,
            upload_dir: std::env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(default.upload_dir),
            cleanup_delay: env_secs("CLEANUP_DELAY_SECS", default.cleanup_delay)?,
            stale_upload_max_age: env_secs("STALE_UPLOAD_MAX_AGE_SECS", default.stale_upload_max_age)?,
            sweep_interval: env_secs("SWEEP_INTERVAL_SECS", default.sweep_interval)?,
        })
    }

    /// 请求体上限：所有文件都顶格时的总大小，再留 1MB 给表单开销
    pub fn request_body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size)
            .saturating_add(MB)
    }

    pub fn api_key_configured(&self) -> bool {
        !self.llm_api_key.trim().is_empty()
    }
}

/// 读取并解析环境变量；未设置时使用默认值，设置了但无法解析则报错
fn env_parse<T: FromStr>(var_name: &str, default: T) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(raw) => parse_value(var_name, &raw),
        Err(_) => Ok(default),
    }
}

fn env_secs(var_name: &str, default: Duration) -> AppResult<Duration> {
    env_parse(var_name, default.as_secs()).map(Duration::from_secs)
}

fn env_megabytes(var_name: &str, default_bytes: usize) -> AppResult<usize> {
    match std::env::var(var_name) {
        Ok(raw) => megabytes_to_bytes(var_name, &raw),
        Err(_) => Ok(default_bytes),
    }
}

/// 兆字节数转字节数，溢出视为解析失败
fn megabytes_to_bytes(var_name: &str, raw: &str) -> AppResult<usize> {
    let megabytes: usize = parse_value(var_name, raw)?;
    megabytes.checked_mul(MB).ok_or_else(|| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: raw.to_string(),
            expected_type: "megabytes within usize range".to_string(),
        }
        .into()
    })
}

fn parse_value<T: FromStr>(var_name: &str, raw: &str) -> AppResult<T> {
    raw.trim().parse().map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: raw.to_string(),
            expected_type: std::any::type_name::<T>().to_string(),
        }
        .into()
    })
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_default_limits() {
        let config = Config::default();
        assert_eq!(config.max_file_size, 15 * MB);
        assert_eq!(config.max_files, 5);
        assert_eq!(config.allowed_mime_types.len(), 4);
        assert!(!config.api_key_configured());
        assert_eq!(config.request_body_limit(), 5 * 15 * MB + MB);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        match err {
            AppError::Config(ConfigError::EnvVarParseFailed { var_name, value, .. }) => {
                assert_eq!(var_name, "PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("意外的错误类型: {}", other),
        }
        assert_eq!(parse_value::<u16>("PORT", " 8080 ").unwrap(), 8080);
    }

    #[test]
    fn test_megabytes_overflow_is_parse_error() {
        assert_eq!(megabytes_to_bytes("MAX_FILE_SIZE_MB", "15").unwrap(), 15 * MB);

        let huge = usize::MAX.to_string();
        match megabytes_to_bytes("MAX_FILE_SIZE_MB", &huge) {
            Err(AppError::Config(ConfigError::EnvVarParseFailed { var_name, value, .. })) => {
                assert_eq!(var_name, "MAX_FILE_SIZE_MB");
                assert_eq!(value, huge);
            }
            other => panic!("意外结果: {:?}", other.map_err(|e| e.to_string())),
        }
    }

    #[test]
    fn test_parse_list_normalizes() {
        assert_eq!(
            parse_list("Image/PNG, image/jpeg ,,"),
            vec!["image/png".to_string(), "image/jpeg".to_string()]
        );
    }
}
