/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// # 参数
/// - `level`: 命令行指定的日志级别，优先于 `RUST_LOG`
pub fn init(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `tag`: 推送标签
/// - `categories`: 抓取的分类
/// - `use_llm`: 是否启用 LLM
/// - `deep_scan`: 是否启用深度扫描
pub fn log_startup(tag: &str, categories: &[String], use_llm: bool, deep_scan: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 arXiv 每日论文推送启动 [{}]", tag);
    info!("📚 分类: {}", categories.join(", "));
    info!("🤖 LLM: {} | 🔬 深度扫描: {}", on_off(use_llm), on_off(deep_scan));
    info!("{}", "=".repeat(60));
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "开启"
    } else {
        "关闭"
    }
}

/// 记录阶段开始
pub fn log_stage(stage: &str, count: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📦 {} ({} 篇)", stage, count);
    info!("{}", "─".repeat(60));
}

/// 单次运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// 去重后抓取的论文数
    pub fetched: usize,
    /// 经过过滤和历史去重后保留的新论文数
    pub kept: usize,
    /// 深度扫描提取到正文的论文数
    pub scanned: usize,
    /// 推送成功的渠道数
    pub notified: usize,
    /// 是否写入了历史记录
    pub history_saved: bool,
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📥 抓取: {}", stats.fetched);
    info!("✅ 新论文: {}", stats.kept);
    info!("🔬 提取到正文: {}", stats.scanned);
    info!("📨 推送成功渠道: {}", stats.notified);
    info!("💾 历史记录: {}", if stats.history_saved { "已保存" } else { "未保存" });
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("一二三四五", 3), "一二三...");
    }
}
