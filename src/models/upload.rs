use std::path::PathBuf;

/// 已写入暂存目录的上传文件
///
/// 由上传接收层创建，分析结束后（无论成败）由延迟清理任务删除。
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// 客户端提供的原始文件名
    pub original_name: String,
    /// 暂存路径
    pub staged_path: PathBuf,
    /// 客户端声明的 MIME 类型（已规范化）
    pub declared_mime_type: String,
    pub size_bytes: usize,
}
