//! 每日推送机器人 - 编排层
//!
//! ## 职责
//!
//! 按固定顺序调度各项业务能力，不包含具体业务判断：
//!
//! 1. 抓取各分类最新论文
//! 2. 关键词过滤
//! 3. LLM 相关性筛选（开启且 hunt prompt 非空时）
//! 4. 与历史记录去重
//! 5. 深度扫描（逐篇顺序执行）与深度点评
//! 6. 摘要翻译
//! 7. 推送飞书、邮件
//! 8. 写入历史记录
//!
//! 所有已配置的渠道都推送失败时不写历史记录，下次运行会重新推送。

use crate::clients::{ArxivClient, ChatModel, LlmClient, PaperRepository};
use crate::config::Config;
use crate::models::Paper;
use crate::scanner::ContentScanner;
use crate::services::{
    filter_by_keywords, EmailNotifier, HistoryStore, LarkNotifier, Notifier, PaperFetcher,
    PaperProcessor,
};
use crate::utils::logging::{self, log_stage, RunStats};
use crate::utils::truncate_text;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 运行时用到的文件路径
#[derive(Debug, Clone)]
pub struct BotPaths {
    /// 历史记录 JSON 文件
    pub papers_file: PathBuf,
    /// LLM 筛选使用的研究方向描述
    pub hunt_file: PathBuf,
}

impl Default for BotPaths {
    fn default() -> Self {
        Self {
            papers_file: PathBuf::from("data/paper_history.json"),
            hunt_file: PathBuf::from("data/hunt_prompt.md"),
        }
    }
}

/// 应用主结构
pub struct ArxivBot {
    config: Config,
    paths: BotPaths,
    fetcher: PaperFetcher,
    repository: Arc<dyn PaperRepository>,
    model: Option<Arc<dyn ChatModel>>,
    notifiers: Vec<Box<dyn Notifier>>,
    history: HistoryStore,
}

impl ArxivBot {
    /// 根据配置创建真实组件
    pub fn new(config: Config, paths: BotPaths) -> Result<Self> {
        let client = ArxivClient::new()?;
        let fetcher = PaperFetcher::new(client.clone(), config.arxiv.max_results);

        let model: Option<Arc<dyn ChatModel>> = if uses_llm(&config) {
            Some(Arc::new(LlmClient::new(&config.llm)))
        } else {
            None
        };

        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(lark) = &config.lark {
            notifiers.push(Box::new(LarkNotifier::new(lark.clone())));
        }
        if let Some(email) = &config.email {
            notifiers.push(Box::new(EmailNotifier::new(email.clone())));
        }

        Ok(Self {
            history: HistoryStore::new(&paths.papers_file),
            repository: Arc::new(client),
            config,
            paths,
            fetcher,
            model,
            notifiers,
        })
    }

    /// 替换源码包仓库
    pub fn with_repository(mut self, repository: Arc<dyn PaperRepository>) -> Self {
        self.repository = repository;
        self
    }

    /// 替换对话模型
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// 替换通知渠道
    pub fn with_notifiers(mut self, notifiers: Vec<Box<dyn Notifier>>) -> Self {
        self.notifiers = notifiers;
        self
    }

    /// 运行一次完整流程
    pub async fn run(&self) -> Result<RunStats> {
        let arxiv = &self.config.arxiv;
        logging::log_startup(
            &arxiv.tag,
            &arxiv.category_list,
            uses_llm(&self.config),
            arxiv.enable_deep_scan,
        );

        let papers = self.fetcher.fetch_latest(&arxiv.category_list).await;
        let stats = self.process(papers).await?;

        logging::print_final_stats(&stats);
        Ok(stats)
    }

    /// 处理已抓取的论文（抓取之后的全部步骤）
    pub async fn process(&self, fetched: Vec<Paper>) -> Result<RunStats> {
        let arxiv = &self.config.arxiv;
        let mut stats = RunStats {
            fetched: fetched.len(),
            ..Default::default()
        };

        let mut papers = filter_by_keywords(fetched, &arxiv.keyword_list);

        if arxiv.use_llm_for_filtering {
            papers = self.filter_with_llm(papers).await;
        }

        let processed_ids = self.history.load_processed_ids();
        let mut papers: Vec<Paper> = papers
            .into_iter()
            .filter(|p| !processed_ids.contains(&p.id))
            .collect();
        stats.kept = papers.len();
        info!("✓ 历史去重后保留 {} 篇新论文", papers.len());

        if papers.is_empty() {
            info!("没有新的论文需要处理");
            return Ok(stats);
        }

        if arxiv.enable_deep_scan {
            papers = self.deep_scan(papers).await;
            stats.scanned = papers.iter().filter(|p| p.has_scanned_content()).count();

            if arxiv.use_llm_for_filtering {
                if let Some(processor) = self.processor() {
                    papers = processor.generate_deep_summary(papers).await;
                }
            }
        }

        if arxiv.use_llm_for_translation {
            if let Some(processor) = self.processor() {
                papers = processor.translate_abstracts(papers).await;
            }
        }

        stats.notified = self.notify(&papers).await;

        if self.notifiers.is_empty() || stats.notified > 0 {
            self.history.save(&papers)?;
            stats.history_saved = true;
        } else {
            warn!("⚠️ 所有推送渠道均失败，本次不写入历史记录");
        }

        Ok(stats)
    }

    fn processor(&self) -> Option<PaperProcessor> {
        self.model.clone().map(PaperProcessor::new)
    }

    async fn filter_with_llm(&self, papers: Vec<Paper>) -> Vec<Paper> {
        let hunt_prompt = match tokio::fs::read_to_string(&self.paths.hunt_file).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "⚠️ 无法读取研究方向描述 {}: {}，跳过 LLM 筛选",
                    self.paths.hunt_file.display(),
                    e
                );
                return papers;
            }
        };
        if hunt_prompt.trim().is_empty() {
            info!("研究方向描述为空，跳过 LLM 筛选");
            return papers;
        }

        match self.processor() {
            Some(processor) => processor.filter_papers(papers, &hunt_prompt).await,
            None => papers,
        }
    }

    async fn deep_scan(&self, papers: Vec<Paper>) -> Vec<Paper> {
        log_stage("深度扫描", papers.len());
        let scanner = ContentScanner::new(self.repository.clone(), self.config.scan.clone());

        let total = papers.len();
        let mut scanned = Vec::with_capacity(total);
        for (i, paper) in papers.into_iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, truncate_text(&paper.title, 60));
            scanned.push(scanner.scan_paper(paper).await);
        }
        scanned
    }

    async fn notify(&self, papers: &[Paper]) -> usize {
        let mut succeeded = 0;
        for notifier in &self.notifiers {
            match notifier.post(papers, &self.config.arxiv.tag).await {
                Ok(()) => succeeded += 1,
                Err(e) => error!("❌ {} 推送失败: {:#}", notifier.name(), e),
            }
        }
        succeeded
    }
}

fn uses_llm(config: &Config) -> bool {
    config.arxiv.use_llm_for_filtering || config.arxiv.use_llm_for_translation
}
