//! 主稿件选择
//!
//! 源码包里往往有多个 .tex（附录、补充材料、分节 include），没有可靠的命名约定。
//! 选择顺序固定：含 `\begin{document}` → 含 Introduction 标题 → 文本最长；
//! 都不含 `\begin{document}` 时取字节数最大的文件。同分时按路径排序取第一个。

use super::section::strip_comments;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 稿件源文件扩展名
pub const MANUSCRIPT_EXTENSION: &str = "tex";

/// 正文开始标记
pub const DOCUMENT_START_MARKER: &str = "\\begin{document}";

/// 候选稿件
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub text: String,
    /// 文件原始字节数
    pub byte_len: u64,
}

impl Candidate {
    fn has_document_marker(&self) -> bool {
        self.text.contains(DOCUMENT_START_MARKER)
    }

    /// 注释掉的标题不算
    fn has_introduction(&self) -> bool {
        introduction_heading()
            .map(|re| re.is_match(&strip_comments(&self.text)))
            .unwrap_or(false)
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

fn introduction_heading() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\\section\*?\s*\{\s*introduction\s*\}").ok())
        .as_ref()
}

/// 递归列出所有 .tex 文件，按完整路径排序
pub fn list_manuscripts(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("遍历目录出错: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|e| e.to_str()) == Some(MANUSCRIPT_EXTENSION)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// 读取候选文件，非 UTF-8 字节按替换字符解码，读失败的文件跳过
pub fn load_candidates(paths: &[PathBuf]) -> Vec<Candidate> {
    paths
        .iter()
        .filter_map(|path| match fs::read(path) {
            Ok(bytes) => Some(Candidate {
                path: path.clone(),
                byte_len: bytes.len() as u64,
                text: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(e) => {
                warn!("读取稿件失败 {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// 从已排序的候选中选出主稿件
pub fn choose_manuscript(candidates: Vec<Candidate>) -> Option<Candidate> {
    let (with_marker, without_marker): (Vec<Candidate>, Vec<Candidate>) = candidates
        .into_iter()
        .partition(Candidate::has_document_marker);

    if !with_marker.is_empty() {
        if let Some(pos) = with_marker.iter().position(Candidate::has_introduction) {
            debug!("选中含 Introduction 的稿件: {}", with_marker[pos].path.display());
            return with_marker.into_iter().nth(pos);
        }
        debug!("没有稿件含 Introduction，按文本长度选择");
        return first_max_by_key(with_marker, Candidate::char_len);
    }

    debug!("没有稿件含 \\begin{{document}}，按文件大小选择");
    first_max_by_key(without_marker, |c| c.byte_len)
}

/// 取最大值，同分时保留靠前的元素
fn first_max_by_key<K: Ord>(
    items: Vec<Candidate>,
    key: impl Fn(&Candidate) -> K,
) -> Option<Candidate> {
    let mut best: Option<(K, Candidate)> = None;
    for item in items {
        let k = key(&item);
        let replace = match &best {
            Some((best_key, _)) => k > *best_key,
            None => true,
        };
        if replace {
            best = Some((k, item));
        }
    }
    best.map(|(_, item)| item)
}

/// 在解压目录中选出主稿件的路径和文本
pub fn select_manuscript(root: &Path) -> Option<Candidate> {
    let paths = list_manuscripts(root);
    if paths.is_empty() {
        return None;
    }
    choose_manuscript(load_candidates(&paths))
}
