//! 程序配置
//!
//! 优先级（从低到高）：默认值 → `ARXIV_` 环境变量 → 主配置文件 → 论文配置文件 → 命令行开关。
//! 配置文件是扁平的键值表，YAML 为主，`.toml` 后缀的文件按 TOML 解析。

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "ARXIV_";

/// 章节正文最大字符数
pub const DEFAULT_MAX_SECTION_CHARS: usize = 2000;

/// 飞书（Lark）机器人配置
#[derive(Clone, Debug, PartialEq)]
pub struct LarkConfig {
    pub webhook_url: String,
    pub template_id: String,
    pub template_version: String,
}

/// 邮件配置
#[derive(Clone, Debug, PartialEq)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: String,
    pub receiver_email: String,
}

/// 论文抓取与筛选配置
#[derive(Clone, Debug, PartialEq)]
pub struct ArxivConfig {
    /// 推送标签
    pub tag: String,
    pub category_list: Vec<String>,
    pub keyword_list: Vec<String>,
    /// 每个分类抓取的最大数量
    pub max_results: usize,
    pub use_llm_for_filtering: bool,
    pub use_llm_for_translation: bool,
    pub enable_deep_scan: bool,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            tag: "LLM Security".to_string(),
            category_list: ["cs.CL", "cs.AI", "cs.CV", "cs.CR", "cs.LG"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            keyword_list: Vec::new(),
            max_results: 100,
            use_llm_for_filtering: true,
            use_llm_for_translation: true,
            enable_deep_scan: false,
        }
    }
}

/// LLM 配置（兼容 OpenAI API 的服务）
#[derive(Clone, Debug, PartialEq)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-r1:32b".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: "ollama".to_string(),
        }
    }
}

/// 深度扫描配置
#[derive(Clone, Debug, PartialEq)]
pub struct ScanConfig {
    /// 章节正文截断长度（字符）
    pub max_section_chars: usize,
    /// 引言章节标题候选，按顺序尝试
    pub introduction_headings: Vec<String>,
    /// 结论章节标题候选，按顺序尝试
    pub conclusion_headings: Vec<String>,
    /// 源码包下载超时
    pub download_timeout: Duration,
    /// 临时目录的父目录，`None` 表示系统临时目录
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_section_chars: DEFAULT_MAX_SECTION_CHARS,
            introduction_headings: vec!["Introduction".to_string()],
            conclusion_headings: vec!["Conclusion".to_string(), "Conclusions".to_string()],
            download_timeout: Duration::from_secs(120),
            scratch_dir: None,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub lark: Option<LarkConfig>,
    pub email: Option<EmailConfig>,
    pub arxiv: ArxivConfig,
    pub llm: LlmConfig,
    pub scan: ScanConfig,
}

/// 配置文件中的扁平键值
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub webhook_url: Option<String>,
    pub template_id: Option<String>,
    pub template_version: Option<String>,

    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub receiver_email: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,

    pub tag: Option<String>,
    pub category_list: Option<Vec<String>>,
    pub keyword_list: Option<Vec<String>>,
    pub max_results: Option<usize>,
    pub use_llm_for_filtering: Option<bool>,
    pub use_llm_for_translation: Option<bool>,
    pub enable_deep_scan: Option<bool>,

    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,

    pub max_section_chars: Option<usize>,
    pub download_timeout_secs: Option<u64>,
    pub scratch_dir: Option<PathBuf>,
}

macro_rules! overlay_fields {
    ($base:expr, $top:expr, $($field:ident),+ $(,)?) => {
        $(
            if $top.$field.is_some() {
                $base.$field = $top.$field;
            }
        )+
    };
}

impl RawConfig {
    /// 从文件加载，文件不存在时返回 `None`
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let parsed = if is_toml {
            toml::from_str::<RawConfig>(&content).map_err(|e| e.to_string())
        } else if content.trim().is_empty() {
            Ok(RawConfig::default())
        } else {
            serde_yaml::from_str::<RawConfig>(&content).map_err(|e| e.to_string())
        };

        parsed
            .map(Some)
            .map_err(|message| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                message,
            })
    }

    /// 用 `top` 中存在的键覆盖当前值
    pub fn overlay(mut self, top: RawConfig) -> Self {
        overlay_fields!(
            self,
            top,
            webhook_url,
            template_id,
            template_version,
            sender_email,
            sender_password,
            receiver_email,
            smtp_server,
            smtp_port,
            tag,
            category_list,
            keyword_list,
            max_results,
            use_llm_for_filtering,
            use_llm_for_translation,
            enable_deep_scan,
            model,
            base_url,
            api_key,
            max_section_chars,
            download_timeout_secs,
            scratch_dir,
        );
        self
    }

    /// 从环境变量读取（`ARXIV_<段>__<字段>`），空值视为未设置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 使用自定义查找函数读取环境变量，便于测试
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, key)).filter(|v| !v.trim().is_empty())
        };

        let mut raw = RawConfig {
            webhook_url: get("LARK__WEBHOOK_URL"),
            template_id: get("LARK__TEMPLATE_ID"),
            template_version: get("LARK__TEMPLATE_VERSION"),
            tag: get("ARXIV__TAG"),
            category_list: get("ARXIV__CATEGORY_LIST").map(|v| parse_list(&v)),
            keyword_list: get("ARXIV__KEYWORD_LIST").map(|v| parse_list(&v)),
            max_results: parse_env(get("ARXIV__MAX_RESULTS"), "ARXIV__MAX_RESULTS", "usize")?,
            use_llm_for_filtering: parse_env(
                get("ARXIV__USE_LLM_FOR_FILTERING"),
                "ARXIV__USE_LLM_FOR_FILTERING",
                "bool",
            )?,
            use_llm_for_translation: parse_env(
                get("ARXIV__USE_LLM_FOR_TRANSLATION"),
                "ARXIV__USE_LLM_FOR_TRANSLATION",
                "bool",
            )?,
            enable_deep_scan: parse_env(
                get("ARXIV__ENABLE_DEEP_SCAN"),
                "ARXIV__ENABLE_DEEP_SCAN",
                "bool",
            )?,
            model: get("LLM__MODEL"),
            base_url: get("LLM__BASE_URL"),
            api_key: get("LLM__API_KEY"),
            max_section_chars: parse_env(
                get("SCAN__MAX_SECTION_CHARS"),
                "SCAN__MAX_SECTION_CHARS",
                "usize",
            )?,
            download_timeout_secs: parse_env(
                get("SCAN__DOWNLOAD_TIMEOUT_SECS"),
                "SCAN__DOWNLOAD_TIMEOUT_SECS",
                "u64",
            )?,
            scratch_dir: get("SCAN__SCRATCH_DIR").map(PathBuf::from),
            ..Default::default()
        };

        // 没有发件人时忽略全部邮件变量
        if let Some(sender) = get("EMAIL__SENDER_EMAIL") {
            raw.sender_email = Some(sender);
            raw.sender_password = get("EMAIL__SENDER_PASSWORD");
            raw.receiver_email = get("EMAIL__RECEIVER_EMAIL");
            raw.smtp_server = get("EMAIL__SMTP_SERVER");
            raw.smtp_port = parse_env(get("EMAIL__SMTP_PORT"), "EMAIL__SMTP_PORT", "u16")?;
        }

        Ok(raw)
    }
}

fn parse_env<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    expected_type: &'static str,
) -> Result<Option<T>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: format!("{}{}", ENV_PREFIX, key),
                value: v,
                expected_type,
            }),
    }
}

/// 列表值支持 JSON 数组或逗号分隔
fn parse_list(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(value) {
            return items;
        }
    }
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    /// 加载配置：环境变量打底，主配置文件覆盖，论文配置文件最后覆盖
    pub fn load(config_path: &Path, paper_config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut raw = RawConfig::from_env()?;

        if let Some(main) = RawConfig::from_file(config_path)? {
            raw = raw.overlay(main);
        }
        if let Some(path) = paper_config_path {
            if let Some(paper) = RawConfig::from_file(path)? {
                raw = raw.overlay(paper);
            }
        }

        Self::from_raw(raw)
    }

    /// 从合并后的键值构建配置
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let lark = match raw.webhook_url {
            Some(webhook_url) => Some(LarkConfig {
                webhook_url,
                template_id: raw.template_id.ok_or(ConfigError::MissingField {
                    section: "lark",
                    field: "template_id",
                })?,
                template_version: raw.template_version.unwrap_or_else(|| "1.0.0".to_string()),
            }),
            None => None,
        };

        let email = match raw.sender_email {
            Some(sender_email) => Some(EmailConfig {
                smtp_server: raw.smtp_server.unwrap_or_else(|| "smtp.gmail.com".to_string()),
                smtp_port: raw.smtp_port.unwrap_or(587),
                sender_email,
                sender_password: raw.sender_password.ok_or(ConfigError::MissingField {
                    section: "email",
                    field: "sender_password",
                })?,
                receiver_email: raw.receiver_email.ok_or(ConfigError::MissingField {
                    section: "email",
                    field: "receiver_email",
                })?,
            }),
            None => None,
        };

        let default_arxiv = ArxivConfig::default();
        let arxiv = ArxivConfig {
            tag: raw.tag.unwrap_or(default_arxiv.tag),
            category_list: raw.category_list.unwrap_or(default_arxiv.category_list),
            keyword_list: raw.keyword_list.unwrap_or(default_arxiv.keyword_list),
            max_results: raw.max_results.unwrap_or(default_arxiv.max_results),
            use_llm_for_filtering: raw
                .use_llm_for_filtering
                .unwrap_or(default_arxiv.use_llm_for_filtering),
            use_llm_for_translation: raw
                .use_llm_for_translation
                .unwrap_or(default_arxiv.use_llm_for_translation),
            enable_deep_scan: raw.enable_deep_scan.unwrap_or(default_arxiv.enable_deep_scan),
        };

        let default_llm = LlmConfig::default();
        let llm = LlmConfig {
            model: raw.model.unwrap_or(default_llm.model),
            base_url: raw.base_url.unwrap_or(default_llm.base_url),
            api_key: raw.api_key.unwrap_or(default_llm.api_key),
        };

        let mut scan = ScanConfig::default();
        if let Some(max_chars) = raw.max_section_chars {
            scan.max_section_chars = max_chars;
        }
        if let Some(secs) = raw.download_timeout_secs {
            scan.download_timeout = Duration::from_secs(secs);
        }
        if raw.scratch_dir.is_some() {
            scan.scratch_dir = raw.scratch_dir;
        }

        Ok(Self {
            lark,
            email,
            arxiv,
            llm,
            scan,
        })
    }

    /// 应用命令行开关：未传入即关闭
    pub fn apply_cli_flags(&mut self, use_llm: bool, deep_scan: bool) {
        self.arxiv.use_llm_for_filtering = use_llm;
        self.arxiv.use_llm_for_translation = use_llm;
        self.arxiv.enable_deep_scan = deep_scan;
    }
}
