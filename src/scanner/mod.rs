//! 深度扫描（Deep Scan）
//!
//! ## 流程
//!
//! ```text
//! 论文 ID
//!   → PaperRepository::resolve      (不存在 → 无内容)
//!   → PaperRepository::download     (只有 PDF / 超时 → 无内容)
//!   → archive::extract_bundle       (不是归档 / 损坏 → 无内容)
//!   → selector::select_manuscript   (没有 .tex → 无内容)
//!   → SectionLocator × 2            (引言、结论)
//! ```
//!
//! 每次扫描独占一个临时目录，任何分支返回前都会删除。
//! 所有失败都在这里折叠为 `ScanOutcome::empty()`，不会向批处理传播。

pub mod archive;
pub mod section;
pub mod selector;

pub use archive::{extract_bundle, Extraction};
pub use section::SectionLocator;
pub use selector::{select_manuscript, Candidate};

use crate::clients::PaperRepository;
use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::models::{Paper, ScanOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// 论文内容扫描器
pub struct ContentScanner {
    repository: Arc<dyn PaperRepository>,
    config: ScanConfig,
}

impl ContentScanner {
    /// 创建扫描器
    ///
    /// # 参数
    /// - `repository`: 论文仓库（真实客户端或测试用假实现）
    /// - `config`: 扫描配置
    pub fn new(repository: Arc<dyn PaperRepository>, config: ScanConfig) -> Self {
        Self { repository, config }
    }

    /// 扫描单篇论文，把引言和结论写回记录
    ///
    /// 扫描失败时原样返回。
    pub async fn scan_paper(&self, mut paper: Paper) -> Paper {
        info!("[论文 {}] 🔬 开始深度扫描...", paper.id);
        let outcome = self.extract_content(&paper.id).await;

        if outcome.is_empty() {
            info!("[论文 {}] 未提取到正文内容", paper.id);
        } else {
            info!(
                "[论文 {}] ✓ 提取完成 (引言: {}, 结论: {})",
                paper.id,
                outcome.introduction.is_some(),
                outcome.conclusion.is_some()
            );
        }

        outcome.apply_to(&mut paper);
        paper
    }

    /// 提取引言和结论，任何失败都返回空结果
    pub async fn extract_content(&self, paper_id: &str) -> ScanOutcome {
        let scratch = match self.create_scratch() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("[论文 {}] ⚠️ 无法创建临时目录 ({}): {}", paper_id, e.cause(), e);
                return ScanOutcome::empty();
            }
        };
        let scratch_path = scratch.path().to_path_buf();

        let result = self.run_pipeline(paper_id, &scratch_path).await;

        if let Err(e) = scratch.close() {
            warn!(
                "[论文 {}] ⚠️ 删除临时目录失败 {}: {}",
                paper_id,
                scratch_path.display(),
                e
            );
        }

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[论文 {}] ⚠️ 深度扫描跳过 ({}): {}", paper_id, e.cause(), e);
                ScanOutcome::empty()
            }
        }
    }

    fn create_scratch(&self) -> ScanResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("arxiv-scan-");
        let dir = match &self.config.scratch_dir {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    async fn run_pipeline(&self, paper_id: &str, scratch: &Path) -> ScanResult<ScanOutcome> {
        let source = self.repository.resolve(paper_id).await?;
        debug!("[论文 {}] 源码包地址: {}", paper_id, source.source_url);

        let download = self.repository.download_source(&source, scratch);
        let bundle = tokio::time::timeout(self.config.download_timeout, download)
            .await
            .map_err(|_| ScanError::Timeout {
                paper_id: paper_id.to_string(),
                seconds: self.config.download_timeout.as_secs(),
            })??;

        let config = self.config.clone();
        let unpack_dir = scratch.join("src");
        tokio::task::spawn_blocking(move || scan_bundle(&bundle, &unpack_dir, &config))
            .await
            .map_err(|e| ScanError::Internal(e.to_string()))?
    }
}

/// 解压、选稿、定位章节（阻塞操作）
///
/// `unpack_dir` 会被创建，调用方负责清理其父目录。
pub fn scan_bundle(bundle: &Path, unpack_dir: &Path, config: &ScanConfig) -> ScanResult<ScanOutcome> {
    std::fs::create_dir_all(unpack_dir)?;

    match extract_bundle(bundle, unpack_dir)? {
        Extraction::NotArchive => {
            return Err(ScanError::NotArchive {
                path: bundle.to_path_buf(),
            })
        }
        kind => debug!("源码包解压完成: {:?}", kind),
    }

    let manuscript = select_manuscript(unpack_dir).ok_or_else(|| ScanError::NoManuscript {
        root: PathBuf::from(unpack_dir),
    })?;
    debug!("选中主稿件: {}", manuscript.path.display());

    Ok(locate_sections(&manuscript.text, config))
}

/// 在稿件文本中分别定位引言和结论
pub fn locate_sections(manuscript: &str, config: &ScanConfig) -> ScanOutcome {
    let locator = SectionLocator::new(config.max_section_chars);
    let cleaned = section::strip_comments(manuscript);

    let find_first = |names: &[String]| {
        names.iter().find_map(|name| {
            let body = locator.locate_in_cleaned(&cleaned, name)?;
            debug!("命中章节 {} ({} 字符)", name, body.chars().count());
            Some(body)
        })
    };

    ScanOutcome {
        introduction: find_first(config.introduction_headings.as_slice()),
        conclusion: find_first(config.conclusion_headings.as_slice()),
    }
}
