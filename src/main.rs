use anyhow::Result;
use arxiv_daily_bot::utils::logging;
use arxiv_daily_bot::{ArxivBot, BotPaths, Config};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// 每日 arXiv 论文推送
#[derive(Debug, Parser)]
#[command(name = "arxiv-bot", version, about)]
struct Cli {
    /// 主配置文件
    #[arg(long, default_value = "data/config.yaml")]
    config: PathBuf,

    /// 论文配置文件，覆盖主配置
    #[arg(long, default_value = "data/paper.yaml")]
    paper_config: PathBuf,

    /// 历史记录文件
    #[arg(long, default_value = "data/paper_history.json")]
    papers_file: PathBuf,

    /// LLM 筛选使用的研究方向描述
    #[arg(long, default_value = "data/hunt_prompt.md")]
    hunt_file: PathBuf,

    /// 启用 LLM 筛选、翻译和深度点评
    #[arg(long)]
    use_llm: bool,

    /// 启用深度扫描
    #[arg(long)]
    deep_scan: bool,

    /// 日志级别，如 info、debug
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // 初始化日志
    logging::init(cli.log_level.as_deref());

    // 加载配置
    let mut config = Config::load(&cli.config, Some(&cli.paper_config))?;
    config.apply_cli_flags(cli.use_llm, cli.deep_scan);
    info!("✓ 配置加载完成: {}", cli.config.display());

    let paths = BotPaths {
        papers_file: cli.papers_file,
        hunt_file: cli.hunt_file,
    };

    // 初始化并运行应用
    ArxivBot::new(config, paths)?.run().await?;

    Ok(())
}
