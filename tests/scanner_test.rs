//! 深度扫描端到端测试
//!
//! 使用内存中的假仓库，不访问网络。

use arxiv_daily_bot::clients::{PaperRepository, SourceRef};
use arxiv_daily_bot::config::ScanConfig;
use arxiv_daily_bot::{ContentScanner, Paper, ScanError, ScanResult};
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// 假仓库中每篇论文的行为
#[derive(Clone)]
enum Behavior {
    Bundle(Vec<u8>),
    NoSource,
    Hang,
}

struct FakeRepository {
    papers: HashMap<String, Behavior>,
}

impl FakeRepository {
    fn new(entries: Vec<(&str, Behavior)>) -> Arc<Self> {
        Arc::new(Self {
            papers: entries
                .into_iter()
                .map(|(id, b)| (id.to_string(), b))
                .collect(),
        })
    }
}

#[async_trait]
impl PaperRepository for FakeRepository {
    async fn resolve(&self, paper_id: &str) -> ScanResult<SourceRef> {
        if self.papers.contains_key(paper_id) {
            Ok(SourceRef {
                paper_id: paper_id.to_string(),
                source_url: format!("fake://{}", paper_id),
            })
        } else {
            Err(ScanError::NotFound {
                paper_id: paper_id.to_string(),
            })
        }
    }

    async fn download_source(&self, source: &SourceRef, dir: &Path) -> ScanResult<PathBuf> {
        match self.papers.get(&source.paper_id).cloned() {
            Some(Behavior::Bundle(bytes)) => {
                let path = dir.join(format!("{}.tar.gz", source.paper_id));
                std::fs::write(&path, bytes)?;
                Ok(path)
            }
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("download should have timed out")
            }
            _ => Err(ScanError::NoSource {
                paper_id: source.paper_id.clone(),
            }),
        }
    }
}

fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    gzip(&tar_bytes(files))
}

const MAIN_TEX: &str = r"\documentclass{article}
\begin{document}
\section{Introduction}
We study X. \cite{foo}
% \section{Conclusion} commented out
\section{Related Work}
Prior art.
\section{Conclusion}
X works well. \label{sec:end}
\bibliography{refs}
\end{document}
";

/// 临时目录根；扫描器在其中创建并删除每次扫描的目录
struct Harness {
    _root: tempfile::TempDir,
    scratch_root: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let scratch_root = root.path().join("scratch");
        Self {
            _root: root,
            scratch_root,
        }
    }

    fn scanner(&self, repository: Arc<FakeRepository>) -> ContentScanner {
        let config = ScanConfig {
            scratch_dir: Some(self.scratch_root.clone()),
            download_timeout: Duration::from_millis(200),
            ..ScanConfig::default()
        };
        ContentScanner::new(repository, config)
    }

    fn residual_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch_root)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

#[tokio::test]
async fn test_extracts_introduction_and_conclusion() {
    let _ = tracing_subscriber::fmt::try_init();
    let harness = Harness::new();
    let bundle = tar_gz(&[
        (
            "paper/appendix.tex",
            "\\begin{document}\n\\section{Proofs}\nLong proofs.\n\\end{document}",
        ),
        ("paper/main.tex", MAIN_TEX),
        ("paper/figures/plot.pdf", "%PDF-1.4"),
    ]);
    let scanner = harness.scanner(FakeRepository::new(vec![("2401.00001", Behavior::Bundle(bundle))]));

    let paper = Paper::new("2401.00001v2", "t", "a", "u", "2024-01-01");
    let paper = scanner.scan_paper(paper).await;

    assert_eq!(paper.introduction.as_deref(), Some("We study X."));
    assert_eq!(paper.conclusion.as_deref(), Some("X works well."));
    assert_eq!(harness.residual_entries(), 0);
}

#[tokio::test]
async fn test_pdf_only_archive_yields_nothing() {
    let harness = Harness::new();
    let bundle = tar_gz(&[("paper.pdf", "%PDF-1.4 not a manuscript")]);
    let scanner = harness.scanner(FakeRepository::new(vec![("1", Behavior::Bundle(bundle))]));

    let outcome = scanner.extract_content("1").await;
    assert!(outcome.introduction.is_none());
    assert!(outcome.conclusion.is_none());
    assert_eq!(harness.residual_entries(), 0);
}

#[tokio::test]
async fn test_raw_pdf_payload_yields_nothing() {
    let harness = Harness::new();
    let scanner = harness.scanner(FakeRepository::new(vec![(
        "1",
        Behavior::Bundle(b"%PDF-1.4\n%binary".to_vec()),
    )]));

    assert!(scanner.extract_content("1").await.is_empty());
    assert_eq!(harness.residual_entries(), 0);
}

#[tokio::test]
async fn test_corrupt_archive_cleans_scratch() {
    let harness = Harness::new();
    let mut tar = tar_bytes(&[("main.tex", MAIN_TEX)]);
    tar.truncate(600);
    let scanner = harness.scanner(FakeRepository::new(vec![("1", Behavior::Bundle(gzip(&tar)))]));

    assert!(scanner.extract_content("1").await.is_empty());
    assert!(harness.scratch_root.exists());
    assert_eq!(harness.residual_entries(), 0);
}

#[tokio::test]
async fn test_repository_failures_yield_nothing() {
    let harness = Harness::new();
    let scanner = harness.scanner(FakeRepository::new(vec![("pdf-only", Behavior::NoSource)]));

    assert!(scanner.extract_content("missing").await.is_empty());
    assert!(scanner.extract_content("pdf-only").await.is_empty());
    assert_eq!(harness.residual_entries(), 0);
}

#[tokio::test]
async fn test_download_timeout_yields_nothing() {
    let harness = Harness::new();
    let scanner = harness.scanner(FakeRepository::new(vec![("slow", Behavior::Hang)]));

    let paper = Paper::new("slow", "t", "a", "u", "2024-01-01");
    let paper = scanner.scan_paper(paper).await;

    assert!(!paper.has_scanned_content());
    assert_eq!(harness.residual_entries(), 0);
}

#[tokio::test]
async fn test_gzipped_single_manuscript() {
    let harness = Harness::new();
    let bundle = gzip(MAIN_TEX.as_bytes());
    let scanner = harness.scanner(FakeRepository::new(vec![("1", Behavior::Bundle(bundle))]));

    let outcome = scanner.extract_content("1").await;
    assert_eq!(outcome.introduction.as_deref(), Some("We study X."));
}
