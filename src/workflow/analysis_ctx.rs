//! 文件分析上下文
//!
//! 封装"我正在分析本次请求的第几个文件"这一信息

use std::fmt::Display;

/// 文件分析上下文
#[derive(Debug, Clone)]
pub struct AnalysisCtx {
    /// 文件在本次请求中的序号（从1开始）
    pub file_index: usize,

    /// 本次请求的文件总数
    pub total_files: usize,

    /// 原始文件名
    pub filename: String,
}

impl AnalysisCtx {
    pub fn new(file_index: usize, total_files: usize, filename: impl Into<String>) -> Self {
        Self {
            file_index,
            total_files,
            filename: filename.into(),
        }
    }
}

impl Display for AnalysisCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文件 {}/{} {}]",
            self.file_index, self.total_files, self.filename
        )
    }
}
