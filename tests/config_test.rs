//! 配置加载测试

use arxiv_daily_bot::{Config, ConfigError};
use std::time::Duration;

const MAIN_YAML: &str = r#"
webhook_url: "https://open.feishu.cn/hook/abc"
template_id: "tpl-main"
tag: "Security"
category_list: ["cs.CR", "cs.AI"]
keyword_list: ["backdoor"]
use_llm_for_filtering: true
model: "qwen2.5:7b"
max_section_chars: 1500
"#;

const PAPER_YAML: &str = r#"
tag: "LLM Security"
keyword_list: ["prompt injection", "jailbreak"]
download_timeout_secs: 30
"#;

#[test]
fn test_paper_config_overrides_main() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("config.yaml");
    let paper = dir.path().join("paper.yaml");
    std::fs::write(&main, MAIN_YAML).unwrap();
    std::fs::write(&paper, PAPER_YAML).unwrap();

    let config = Config::load(&main, Some(&paper)).unwrap();

    assert_eq!(config.arxiv.tag, "LLM Security");
    assert_eq!(config.arxiv.category_list, vec!["cs.CR", "cs.AI"]);
    assert_eq!(config.arxiv.keyword_list, vec!["prompt injection", "jailbreak"]);
    assert!(config.arxiv.use_llm_for_filtering);
    assert_eq!(config.llm.model, "qwen2.5:7b");
    assert_eq!(config.scan.max_section_chars, 1500);
    assert_eq!(config.scan.download_timeout, Duration::from_secs(30));

    let lark = config.lark.expect("lark 配置应存在");
    assert_eq!(lark.template_id, "tpl-main");
    assert_eq!(lark.template_version, "1.0.0");
    assert!(config.email.is_none());
}

#[test]
fn test_missing_files_use_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("none.yaml"), None).unwrap();

    assert!(config.lark.is_none());
    assert_eq!(config.arxiv.max_results, 100);
    assert_eq!(config.scan.max_section_chars, 2000);
}

#[test]
fn test_toml_main_config() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("config.toml");
    std::fs::write(
        &main,
        r#"
sender_email = "bot@example.com"
sender_password = "secret"
receiver_email = "me@example.com"
smtp_port = 465
category_list = ["cs.LG"]
"#,
    )
    .unwrap();

    let config = Config::load(&main, None).unwrap();
    let email = config.email.expect("email 配置应存在");
    assert_eq!(email.smtp_port, 465);
    assert_eq!(email.smtp_server, "smtp.gmail.com");
    assert_eq!(config.arxiv.category_list, vec!["cs.LG"]);
}

#[test]
fn test_incomplete_email_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("config.yaml");
    std::fs::write(&main, "sender_email: bot@example.com\n").unwrap();

    let err = Config::load(&main, None).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingField {
            section: "email",
            field: "sender_password"
        }
    ));
}

#[test]
fn test_invalid_yaml_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("config.yaml");
    std::fs::write(&main, "max_results: [not a number\n").unwrap();

    let err = Config::load(&main, None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed { .. }));
}

#[test]
fn test_cli_flags_are_strict() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("config.yaml");
    std::fs::write(&main, "use_llm_for_translation: true\nenable_deep_scan: true\n").unwrap();

    let mut config = Config::load(&main, None).unwrap();
    config.apply_cli_flags(false, false);

    assert!(!config.arxiv.use_llm_for_translation);
    assert!(!config.arxiv.enable_deep_scan);
}
