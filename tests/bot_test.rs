//! 推送流程测试
//!
//! 抓取之后的全部步骤，使用假模型、假仓库和假通知渠道。

use anyhow::{anyhow, Result};
use arxiv_daily_bot::clients::{ChatModel, PaperRepository, SourceRef};
use arxiv_daily_bot::services::{HistoryStore, Notifier};
use arxiv_daily_bot::{ArxivBot, BotPaths, Config, Paper, ScanError, ScanResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// 记录收到的论文，可设置为失败
struct RecordingNotifier {
    fail: bool,
    received: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn post(&self, papers: &[Paper], _tag: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("channel down"));
        }
        let mut received = self.received.lock().unwrap();
        received.extend(papers.iter().map(|p| p.id.clone()));
        Ok(())
    }
}

/// 筛选时只接受标题含 "keep" 的论文，其余提示词原样回显
struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.contains("Yes") {
            if prompt.contains("keep") {
                Ok("<think>looks relevant</think>Yes".to_string())
            } else {
                Ok("No".to_string())
            }
        } else {
            Ok("翻译结果".to_string())
        }
    }
}

/// 任何论文都没有源码包
struct NoSourceRepository;

#[async_trait]
impl PaperRepository for NoSourceRepository {
    async fn resolve(&self, paper_id: &str) -> ScanResult<SourceRef> {
        Ok(SourceRef {
            paper_id: paper_id.to_string(),
            source_url: String::new(),
        })
    }

    async fn download_source(&self, source: &SourceRef, _dir: &Path) -> ScanResult<PathBuf> {
        Err(ScanError::NoSource {
            paper_id: source.paper_id.clone(),
        })
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(hunt_prompt: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hunt_prompt.md"), hunt_prompt).unwrap();
        Self { dir }
    }

    fn paths(&self) -> BotPaths {
        BotPaths {
            papers_file: self.dir.path().join("data").join("history.json"),
            hunt_file: self.dir.path().join("hunt_prompt.md"),
        }
    }

    fn history(&self) -> HistoryStore {
        HistoryStore::new(self.paths().papers_file)
    }
}

fn config(use_llm: bool, deep_scan: bool) -> Config {
    let mut config = Config::default();
    config.arxiv.keyword_list = vec!["attack".to_string()];
    config.scan.scratch_dir = Some(std::env::temp_dir().join("arxiv-bot-tests"));
    config.apply_cli_flags(use_llm, deep_scan);
    config
}

fn paper(id: &str, title: &str, abstract_text: &str) -> Paper {
    Paper::new(id, title, abstract_text, format!("https://arxiv.org/abs/{}", id), "2024-01-01")
}

fn fetched() -> Vec<Paper> {
    vec![
        paper("1", "keep this", "A new attack on models."),
        paper("2", "drop this", "Another attack."),
        paper("3", "keep but off-topic", "Weather forecasting."),
        paper("4v2", "keep old", "An old attack."),
    ]
}

fn recording(fail: bool) -> (Box<dyn Notifier>, Arc<Mutex<Vec<String>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let notifier = RecordingNotifier {
        fail,
        received: received.clone(),
    };
    (Box::new(notifier), received)
}

#[tokio::test]
async fn test_full_pipeline_with_llm() {
    let _ = tracing_subscriber::fmt::try_init();
    let fixture = Fixture::new("Attacks on language models");
    fixture.history().save(&[paper("4", "keep old", "seen")]).unwrap();

    let (notifier, received) = recording(false);
    let bot = ArxivBot::new(config(true, true), fixture.paths())
        .unwrap()
        .with_model(Arc::new(EchoModel))
        .with_repository(Arc::new(NoSourceRepository))
        .with_notifiers(vec![notifier]);

    let stats = bot.process(fetched()).await.unwrap();

    assert_eq!(stats.fetched, 4);
    assert_eq!(stats.kept, 1);
    assert_eq!(stats.scanned, 0);
    assert_eq!(stats.notified, 1);
    assert!(stats.history_saved);
    assert_eq!(*received.lock().unwrap(), vec!["1".to_string()]);

    let processed = fixture.history().load_processed_ids();
    assert!(processed.contains("1"));
    assert!(processed.contains("4"));
}

#[tokio::test]
async fn test_all_notifiers_failing_skips_history() {
    let fixture = Fixture::new("");
    let (failing, _) = recording(true);

    let bot = ArxivBot::new(config(false, false), fixture.paths())
        .unwrap()
        .with_notifiers(vec![failing]);

    let stats = bot.process(fetched()).await.unwrap();

    assert_eq!(stats.kept, 3);
    assert_eq!(stats.notified, 0);
    assert!(!stats.history_saved);
    assert!(fixture.history().load_processed_ids().is_empty());
}

#[tokio::test]
async fn test_one_notifier_success_saves_history() {
    let fixture = Fixture::new("");
    let (failing, _) = recording(true);
    let (working, received) = recording(false);

    let bot = ArxivBot::new(config(false, false), fixture.paths())
        .unwrap()
        .with_notifiers(vec![failing, working]);

    let stats = bot.process(fetched()).await.unwrap();

    assert_eq!(stats.notified, 1);
    assert!(stats.history_saved);
    assert_eq!(received.lock().unwrap().len(), 3);
    assert_eq!(fixture.history().load_processed_ids().len(), 3);
}

#[tokio::test]
async fn test_empty_hunt_prompt_skips_llm_filter() {
    let fixture = Fixture::new("   \n");
    let (notifier, received) = recording(false);

    let bot = ArxivBot::new(config(true, false), fixture.paths())
        .unwrap()
        .with_model(Arc::new(EchoModel))
        .with_notifiers(vec![notifier]);

    let stats = bot.process(fetched()).await.unwrap();

    assert_eq!(stats.kept, 3);
    assert_eq!(received.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_nothing_new_stops_early() {
    let fixture = Fixture::new("");
    let (notifier, received) = recording(false);

    let bot = ArxivBot::new(config(false, false), fixture.paths())
        .unwrap()
        .with_notifiers(vec![notifier]);

    let stats = bot
        .process(vec![paper("9", "t", "Nothing relevant.")])
        .await
        .unwrap();

    assert_eq!(stats.kept, 0);
    assert!(!stats.history_saved);
    assert!(received.lock().unwrap().is_empty());
}
