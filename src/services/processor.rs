//! 论文处理服务 - 业务能力层
//!
//! 基于 LLM 的三项能力：相关性筛选、摘要翻译、深度点评。
//! 只依赖 `ChatModel` 接口，不关心调用顺序。

use crate::clients::ChatModel;
use crate::models::Paper;
use crate::scanner::section::truncate_chars;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// 深度点评中引言的最大字符数
const SUMMARY_INTRO_CHARS: usize = 2000;
/// 深度点评中结论的最大字符数
const SUMMARY_CONCLUSION_CHARS: usize = 1000;

fn think_block() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").ok())
        .as_ref()
}

/// 去掉推理模型输出的 `<think>...</think>` 块
pub fn strip_reasoning(response: &str) -> String {
    match think_block() {
        Some(re) => re.replace_all(response, "").trim().to_string(),
        None => response.trim().to_string(),
    }
}

/// 论文处理服务
pub struct PaperProcessor {
    model: Arc<dyn ChatModel>,
}

impl PaperProcessor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    async fn ask(&self, prompt: &str) -> Option<String> {
        match self.model.complete(prompt).await {
            Ok(response) => Some(strip_reasoning(&response)),
            Err(e) => {
                warn!("LLM 服务错误: {:#}", e);
                None
            }
        }
    }

    /// 用 LLM 判断论文是否符合要寻找的研究内容
    ///
    /// 调用失败时保留该论文。
    pub async fn filter_papers(&self, papers: Vec<Paper>, hunt_prompt: &str) -> Vec<Paper> {
        info!("🤖 正在使用 LLM 筛选 {} 篇论文...", papers.len());
        let mut kept = Vec::new();

        for paper in papers {
            let prompt = build_filter_prompt(&paper, hunt_prompt);
            match self.ask(&prompt).await {
                None => {
                    warn!("[论文 {}] ⚠️ LLM 调用失败，默认保留", paper.id);
                    kept.push(paper);
                }
                Some(answer) if answer.to_lowercase().contains("yes") => {
                    debug!("[论文 {}] LLM 判断: 相关", paper.id);
                    kept.push(paper);
                }
                Some(answer) => {
                    debug!("[论文 {}] LLM 判断: 不相关 ({})", paper.id, answer);
                }
            }
        }

        info!("✓ LLM 筛选保留 {} 篇论文", kept.len());
        kept
    }

    /// 将摘要翻译为中文
    pub async fn translate_abstracts(&self, mut papers: Vec<Paper>) -> Vec<Paper> {
        info!("🌐 正在翻译 {} 篇论文摘要...", papers.len());
        for paper in papers.iter_mut() {
            let prompt = build_translation_prompt(&paper.abstract_text);
            if let Some(translation) = self.ask(&prompt).await.filter(|t| !t.is_empty()) {
                paper.zh_abstract = Some(translation);
            }
        }
        papers
    }

    /// 为扫描到正文的论文生成深度点评
    pub async fn generate_deep_summary(&self, mut papers: Vec<Paper>) -> Vec<Paper> {
        info!("🧠 正在为已扫描的论文生成深度点评...");
        for paper in papers.iter_mut() {
            if !paper.has_scanned_content() {
                continue;
            }
            let prompt = build_summary_prompt(paper);
            if let Some(summary) = self.ask(&prompt).await.filter(|s| !s.is_empty()) {
                paper.deep_summary = Some(summary);
            }
        }
        papers
    }
}

fn build_filter_prompt(paper: &Paper, hunt_prompt: &str) -> String {
    format!(
        r#"你是一名学术论文筛选助手，需要判断下面这篇论文是否属于我正在追踪的研究方向。

论文标题：{}
论文摘要：{}

我正在追踪的研究方向：
{}

---

请从研究主题和关键概念两方面判断相关性。
相关请只回答 "Yes"，不相关请只回答 "No"，不要输出其他内容。"#,
        paper.title, paper.abstract_text, hunt_prompt
    )
}

fn build_translation_prompt(abstract_text: &str) -> String {
    format!(
        r#"把下面的论文摘要翻译成中文：
{}

要求：
- 中文语境里习惯直接使用的英文术语保留原文，例如 Transformer。
- 其余关键术语采用"中文(English)"的形式，例如 后门攻击(Backdoor Attack)。
- 只输出译文，不要解释。"#,
        abstract_text
    )
}

fn build_summary_prompt(paper: &Paper) -> String {
    let intro = paper
        .introduction
        .as_deref()
        .map(|t| truncate_chars(t, SUMMARY_INTRO_CHARS))
        .unwrap_or_else(|| "None".to_string());
    let conclusion = paper
        .conclusion
        .as_deref()
        .map(|t| truncate_chars(t, SUMMARY_CONCLUSION_CHARS))
        .unwrap_or_else(|| "None".to_string());

    format!(
        r#"You are a senior researcher in this field. Review the paper below the way you would review a colleague's work: be critical, do not merely restate it.

Answer in Chinese, plain text only (no Markdown, no ** or *), in exactly this layout:

1. 核心创新: one sentence naming the most novel contribution.
2. 关键结论: (1) ...; (2) ... separated by semicolons.
3. 专家点评: 2-3 sentences on significance, likely impact or limitations.

Title: {}
Abstract: {}
Introduction: {}
Conclusion: {}"#,
        paper.title, paper.abstract_text, intro, conclusion
    )
}
