//! 章节定位
//!
//! 按标题定位单个章节，截取到下一个 `\section`、参考文献标记或 `\end{document}`，
//! 去掉 LaTeX 命令后截断。只做定位，不构建文档大纲。

use regex::Regex;
use std::sync::OnceLock;

fn comment_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // 未转义的 % 到行尾
    RE.get_or_init(|| Regex::new(r"(?m)(^|[^\\])%.*$").ok())
        .as_ref()
}

fn terminator_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\\section|\\bibliographystyle|\\bibliography|\\begin\{thebibliography\}|\\end\{document\}",
        )
        .ok()
    })
    .as_ref()
}

fn command_with_argument() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\[a-zA-Z]+\*?(?:\[[^\]\n]*\])?\{[^}\n]*\}").ok())
        .as_ref()
}

fn bare_command() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\[a-zA-Z]+\*?").ok()).as_ref()
}

/// 去掉行注释
pub fn strip_comments(text: &str) -> String {
    match comment_pattern() {
        Some(re) => re.replace_all(text, "$1").into_owned(),
        None => text.to_string(),
    }
}

/// 去掉带参数的命令（连同参数）和不带参数的命令
pub fn strip_markup(text: &str) -> String {
    let mut cleaned = text.to_string();
    for re in [command_with_argument(), bare_command()].into_iter().flatten() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}

/// 按字符截断
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// 章节定位器
#[derive(Debug, Clone)]
pub struct SectionLocator {
    max_chars: usize,
}

impl SectionLocator {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// 提取指定名称章节的正文
    ///
    /// 找不到标题，或标题之后没有任何结束标记时返回 `None`。
    pub fn locate(&self, manuscript: &str, section_name: &str) -> Option<String> {
        let cleaned = strip_comments(manuscript);
        self.locate_in_cleaned(&cleaned, section_name)
    }

    /// 对已去掉注释的文本定位，供同一稿件多次查找时复用
    pub fn locate_in_cleaned(&self, cleaned: &str, section_name: &str) -> Option<String> {
        let heading = Regex::new(&format!(
            r"(?i)\\section\*?\s*\{{\s*{}\s*\}}",
            regex::escape(section_name)
        ))
        .ok()?;

        let body_start = heading.find(cleaned)?.end();
        let rest = &cleaned[body_start..];
        let body_end = terminator_pattern()?.find(rest)?.start();

        // 只有 \input 之类命令的章节清理后为空，按缺失处理
        let body = strip_markup(&rest[..body_end]);
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        Some(truncate_chars(body, self.max_chars))
    }
}

impl Default for SectionLocator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_SECTION_CHARS)
    }
}
