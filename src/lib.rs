//! # arXiv Daily Bot
//!
//! 每天抓取 arXiv 指定分类的新论文，筛选后推送到飞书和邮箱
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 对外部服务的访问，只暴露能力
//! - `ArxivClient` - arXiv 查询 API 与源码包下载
//! - `LlmClient` - 兼容 OpenAI 接口的对话模型
//!
//! ### ② 深度扫描（Scanner）
//! - `scanner/` - 下载源码包、解压、挑选主稿件、截取引言和结论
//! - 所有失败都折叠为"无内容"，不影响其他论文
//!
//! ### ③ 业务能力层（Services）
//! - `PaperFetcher` - 抓取、去重、关键词过滤
//! - `PaperProcessor` - LLM 筛选、翻译、深度点评
//! - `LarkNotifier` / `EmailNotifier` - 推送
//! - `HistoryStore` - 已推送论文的存档
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/bot` - 按顺序调度一次完整推送
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod scanner;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError, ScanError, ScanResult};
pub use models::{Paper, ScanOutcome};
pub use orchestrator::{ArxivBot, BotPaths};
pub use scanner::ContentScanner;
