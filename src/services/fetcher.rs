//! 论文抓取服务 - 业务能力层
//!
//! 按分类抓取、去重、关键词过滤

use crate::clients::ArxivClient;
use crate::models::Paper;
use std::collections::HashSet;
use tracing::{info, warn};

/// 论文抓取服务
pub struct PaperFetcher {
    client: ArxivClient,
    max_results: usize,
}

impl PaperFetcher {
    pub fn new(client: ArxivClient, max_results: usize) -> Self {
        Self {
            client,
            max_results,
        }
    }

    /// 抓取所有分类的最新论文并按 ID 去重
    ///
    /// 单个分类失败只记录日志，不影响其他分类。
    pub async fn fetch_latest(&self, categories: &[String]) -> Vec<Paper> {
        let mut all_papers = Vec::new();

        for category in categories {
            match self.client.latest_papers(category, self.max_results).await {
                Ok(papers) => all_papers.extend(papers),
                Err(e) => warn!("⚠️ 抓取分类 {} 失败: {:#}", category, e),
            }
        }

        let unique = deduplicate(all_papers);
        info!("✓ 共抓取 {} 篇不重复的论文", unique.len());
        unique
    }
}

/// 按 ID 去重，保留第一次出现的记录
pub fn deduplicate(papers: Vec<Paper>) -> Vec<Paper> {
    let mut seen = HashSet::new();
    papers
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

/// 按关键词过滤摘要
///
/// - 单词关键词：与摘要中去掉首尾标点后的词完全相同
/// - 多词关键词：作为短语出现在规范化后的摘要中
///
/// 关键词列表为空时原样返回。
pub fn filter_by_keywords(papers: Vec<Paper>, keywords: &[String]) -> Vec<Paper> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return papers;
    }

    info!("🔎 正在按关键词过滤 {} 篇论文...", papers.len());

    let (phrases, words): (Vec<&String>, Vec<&String>) =
        keywords.iter().partition(|k| k.contains(char::is_whitespace));

    let kept: Vec<Paper> = papers
        .into_iter()
        .filter(|paper| {
            let lowered = paper.abstract_text.to_lowercase();
            let tokens: HashSet<&str> = lowered
                .split_whitespace()
                .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
                .collect();
            if words.iter().any(|w| tokens.contains(w.as_str())) {
                return true;
            }
            if phrases.is_empty() {
                return false;
            }
            let normalized = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
            phrases.iter().any(|p| {
                let phrase = p.split_whitespace().collect::<Vec<_>>().join(" ");
                normalized.contains(&phrase)
            })
        })
        .collect();

    info!("✓ 关键词过滤保留 {} 篇论文", kept.len());
    kept
}
