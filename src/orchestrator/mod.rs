//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次推送的流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! bot::ArxivBot (处理 Vec<Paper>)
//!     ↓
//! services (能力层：fetch / llm / notify / history)
//! scanner  (深度扫描：单篇论文 → 引言 + 结论)
//!     ↓
//! clients (基础设施：arXiv API、LLM API)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → services / scanner → clients
//! 2. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod bot;

pub use bot::{ArxivBot, BotPaths};
