//! 论文仓库接口
//!
//! 深度扫描只依赖这个接口，测试中可以替换为假实现。

use crate::error::ScanResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 可下载的源码包引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// 规范化后的论文 ID
    pub paper_id: String,
    /// 源码包下载地址
    pub source_url: String,
}

/// 论文仓库
///
/// 两步都可能以"预期失败"结束（论文不存在、只有 PDF），用 `ScanError` 表达。
#[async_trait]
pub trait PaperRepository: Send + Sync {
    /// 将论文 ID 解析为源码包引用
    async fn resolve(&self, paper_id: &str) -> ScanResult<SourceRef>;

    /// 下载源码包到 `dir`，返回本地文件路径
    async fn download_source(&self, source: &SourceRef, dir: &Path) -> ScanResult<PathBuf>;
}
