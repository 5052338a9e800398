use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 论文记录
///
/// `id` / `title` / `abstract` / `url` / `published` 创建后不再修改，
/// 其余字段由扫描、总结、翻译等后续阶段填充。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
    pub published: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zh_abstract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_summary: Option<String>,
}

impl Paper {
    /// 创建论文记录，ID 会去掉版本号后缀
    pub fn new(
        id: &str,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        url: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Self {
            id: normalize_paper_id(id),
            title: title.into(),
            abstract_text: abstract_text.into(),
            url: url.into(),
            published: published.into(),
            zh_abstract: None,
            introduction: None,
            conclusion: None,
            deep_summary: None,
        }
    }

    /// 是否已经扫描到正文内容
    pub fn has_scanned_content(&self) -> bool {
        self.introduction.is_some() || self.conclusion.is_some()
    }
}

impl std::fmt::Display for Paper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title_preview = if self.title.chars().count() > 60 {
            self.title.chars().take(60).collect::<String>() + "..."
        } else {
            self.title.clone()
        };
        write!(f, "[{}] {}", self.id, title_preview)
    }
}

fn version_suffix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v\d+$").ok()).as_ref()
}

/// 规范化论文 ID
///
/// 去掉 `arXiv:` 前缀和 `v<数字>` 版本后缀，使重新提交的版本与历史记录去重。
pub fn normalize_paper_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("arXiv:").unwrap_or(trimmed);
    match version_suffix() {
        Some(re) => re.replace(trimmed, "").into_owned(),
        None => trimmed.to_string(),
    }
}

/// 单篇论文的深度扫描结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub introduction: Option<String>,
    pub conclusion: Option<String>,
}

impl ScanOutcome {
    /// 无内容
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.introduction.is_none() && self.conclusion.is_none()
    }

    /// 将结果写回论文记录，缺失的章节不覆盖已有字段
    pub fn apply_to(self, paper: &mut Paper) {
        if let Some(intro) = self.introduction {
            paper.introduction = Some(intro);
        }
        if let Some(conclusion) = self.conclusion {
            paper.conclusion = Some(conclusion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_version_suffix() {
        assert_eq!(normalize_paper_id("2401.01234v2"), "2401.01234");
        assert_eq!(normalize_paper_id("2401.01234v12"), "2401.01234");
        assert_eq!(normalize_paper_id("arXiv:2401.01234v1"), "2401.01234");
        assert_eq!(normalize_paper_id("2401.01234"), "2401.01234");
    }

    #[test]
    fn test_normalize_keeps_inner_v() {
        // 旧式 ID 的分类名中可能包含字母 v
        assert_eq!(normalize_paper_id("solv-int/9901001v1"), "solv-int/9901001");
    }

    #[test]
    fn test_paper_serializes_abstract_key() {
        let paper = Paper::new("2401.00001v3", "T", "A", "http://arxiv.org/abs/2401.00001v3", "2024-01-01");
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["id"], "2401.00001");
        assert_eq!(json["abstract"], "A");
        assert!(json.get("introduction").is_none());

        let back: Paper = serde_json::from_value(json).unwrap();
        assert_eq!(back, paper);
    }

    #[test]
    fn test_outcome_apply_keeps_existing_fields() {
        let mut paper = Paper::new("1", "T", "A", "u", "d");
        paper.conclusion = Some("old".to_string());

        ScanOutcome {
            introduction: Some("intro".to_string()),
            conclusion: None,
        }
        .apply_to(&mut paper);

        assert_eq!(paper.introduction.as_deref(), Some("intro"));
        assert_eq!(paper.conclusion.as_deref(), Some("old"));
    }
}
