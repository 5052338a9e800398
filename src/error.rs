//! 错误类型
//!
//! - `ScanError`：深度扫描过程中的"预期失败"，在扫描编排层统一折叠为"无内容"
//! - `AppError`：配置、历史记录、通知、LLM 等应用层错误

use std::path::PathBuf;
use thiserror::Error;

/// 深度扫描错误
///
/// 所有变体都是可预期的结果，不会中断批处理。
#[derive(Debug, Error)]
pub enum ScanError {
    /// 仓库中不存在该论文
    #[error("论文不存在: {paper_id}")]
    NotFound { paper_id: String },

    /// 论文存在，但只发布了 PDF，没有源码包
    #[error("论文没有可用的源码包: {paper_id}")]
    NoSource { paper_id: String },

    /// 下载源码包失败
    #[error("下载源码包失败 ({paper_id}): {message}")]
    Download { paper_id: String, message: String },

    /// 下载超时
    #[error("下载源码包超时 ({paper_id})，超过 {seconds} 秒")]
    Timeout { paper_id: String, seconds: u64 },

    /// 下载内容不是可识别的归档格式
    #[error("源码包不是归档文件: {}", path.display())]
    NotArchive { path: PathBuf },

    /// 归档损坏或包含不支持的条目
    #[error("归档无法解压 ({}): {source}", path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解压后的目录中没有可用的 .tex 文件
    #[error("没有找到主稿件文件: {}", root.display())]
    NoManuscript { root: PathBuf },

    /// 临时目录等文件系统操作失败
    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),

    /// 阻塞任务异常退出
    #[error("扫描任务异常: {0}")]
    Internal(String),
}

impl ScanError {
    /// 日志中使用的简短原因标签
    pub fn cause(&self) -> &'static str {
        match self {
            ScanError::NotFound { .. } => "identifier-not-found",
            ScanError::NoSource { .. } => "no-source-available",
            ScanError::Download { .. } => "download-failed",
            ScanError::Timeout { .. } => "download-timeout",
            ScanError::NotArchive { .. } => "not-an-archive",
            ScanError::ArchiveUnreadable { .. } => "archive-unreadable",
            ScanError::NoManuscript { .. } => "no-manuscript-candidate",
            ScanError::Io(_) => "scratch-io",
            ScanError::Internal(_) => "internal",
        }
    }
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("历史记录文件错误 ({}): {source}", path.display())]
    History {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("通知发送失败 ({channel}): {message}")]
    Notify { channel: &'static str, message: String },

    #[error("LLM 调用失败 (模型: {model}): {message}")]
    Llm { model: String, message: String },

    #[error("arXiv API 错误: {0}")]
    Arxiv(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("配置文件解析失败 ({}): {message}", path.display())]
    ParseFailed { path: PathBuf, message: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },

    /// 某个配置段缺少必填字段
    #[error("配置段 [{section}] 缺少必填字段: {field}")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },
}

impl AppError {
    /// 创建历史记录文件错误
    pub fn history(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::History {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// 创建 LLM 调用错误
    pub fn llm(model: impl Into<String>, message: impl ToString) -> Self {
        AppError::Llm {
            model: model.into(),
            message: message.to_string(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 深度扫描结果类型
pub type ScanResult<T> = Result<T, ScanError>;
