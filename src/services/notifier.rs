//! 通知服务 - 业务能力层
//!
//! 把当日论文推送到飞书（Lark）卡片和邮件。

use crate::config::{EmailConfig, LarkConfig};
use crate::error::AppError;
use crate::models::Paper;
use anyhow::Result;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use minijinja::{context, Environment};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// 邮件中引言预览的最大字符数
const INTRO_PREVIEW_CHARS: usize = 500;

/// 模板名以 .html 结尾，渲染时自动转义
const EMAIL_TEMPLATE_NAME: &str = "email.html";
const EMAIL_TEMPLATE: &str = include_str!("templates/email.html");

/// 通知渠道
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 渠道名称，用于日志
    fn name(&self) -> &'static str;

    /// 推送论文列表，空列表直接返回
    async fn post(&self, papers: &[Paper], tag: &str) -> Result<()>;
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

// ========== 飞书 ==========

/// 飞书 Webhook 通知
pub struct LarkNotifier {
    config: LarkConfig,
    http: reqwest::Client,
}

impl LarkNotifier {
    pub fn new(config: LarkConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// 构建模板卡片消息体
    pub fn build_card(&self, papers: &[Paper], tag: &str, today_date: &str) -> Value {
        let table_rows: Vec<Value> = papers
            .iter()
            .enumerate()
            .map(|(i, p)| {
                json!({
                    "index": i + 1,
                    "title": p.title,
                    "url": format!("[{}]({})", p.url, p.url),
                })
            })
            .collect();

        let paper_list: Vec<Value> = papers
            .iter()
            .enumerate()
            .map(|(i, p)| {
                json!({
                    "counter": i + 1,
                    "title": p.title,
                    "id": p.id,
                    "abstract": p.abstract_text,
                    "zh_abstract": p.zh_abstract.as_deref().unwrap_or("Running translation..."),
                    "deep_summary": p.deep_summary.as_deref().unwrap_or_default(),
                    "url": p.url,
                    "published": p.published,
                })
            })
            .collect();

        json!({
            "msg_type": "interactive",
            "card": {
                "type": "template",
                "data": {
                    "template_id": self.config.template_id,
                    "template_version_name": self.config.template_version,
                    "template_variable": {
                        "today_date": today_date,
                        "tag": tag,
                        "total_paper": papers.len(),
                        "table_rows": table_rows,
                        "paper_list": paper_list,
                    }
                }
            }
        })
    }
}

#[async_trait]
impl Notifier for LarkNotifier {
    fn name(&self) -> &'static str {
        "lark"
    }

    async fn post(&self, papers: &[Paper], tag: &str) -> Result<()> {
        if papers.is_empty() {
            info!("没有需要推送到飞书的论文");
            return Ok(());
        }

        info!("📨 正在推送 {} 篇论文到飞书...", papers.len());
        let body = self.build_card(papers, tag, &today());

        let response = self
            .http
            .post(&self.config.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Notify {
                channel: "lark",
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::Notify {
                channel: "lark",
                message: format!("HTTP {}: {}", status, text),
            }
            .into());
        }

        debug!("飞书响应: {}", text);
        check_lark_reply(&text)?;
        info!("✓ 飞书推送成功");
        Ok(())
    }
}

/// 飞书在 HTTP 200 里用非零 `code` 表示业务失败
fn check_lark_reply(text: &str) -> Result<(), AppError> {
    let Ok(reply) = serde_json::from_str::<Value>(text) else {
        return Ok(());
    };
    match reply.get("code").and_then(Value::as_i64) {
        Some(code) if code != 0 => Err(AppError::Notify {
            channel: "lark",
            message: format!(
                "code {}: {}",
                code,
                reply.get("msg").and_then(Value::as_str).unwrap_or_default()
            ),
        }),
        _ => Ok(()),
    }
}

// ========== 邮件 ==========

/// 邮件模板中的单篇论文
#[derive(Debug, Serialize)]
struct EmailEntry<'a> {
    title: &'a str,
    url: &'a str,
    id: &'a str,
    published: &'a str,
    zh_abstract: Option<&'a str>,
    abstract_text: &'a str,
    intro_preview: Option<String>,
}

impl<'a> From<&'a Paper> for EmailEntry<'a> {
    fn from(paper: &'a Paper) -> Self {
        Self {
            title: &paper.title,
            url: &paper.url,
            id: &paper.id,
            published: &paper.published,
            zh_abstract: paper.zh_abstract.as_deref(),
            abstract_text: &paper.abstract_text,
            intro_preview: paper
                .introduction
                .as_deref()
                .map(|intro| intro.chars().take(INTRO_PREVIEW_CHARS).collect()),
        }
    }
}

/// SMTP 邮件通知（STARTTLS）
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn build_subject(tag: &str, today_date: &str) -> String {
        format!("[{}] ArXiv Papers Daily - {}", tag, today_date)
    }

    /// 用内置模板渲染 HTML 正文
    pub fn build_html(papers: &[Paper]) -> Result<String, AppError> {
        let render_error = |e: minijinja::Error| AppError::Notify {
            channel: "email",
            message: format!("模板渲染失败: {:#}", e),
        };

        let mut env = Environment::new();
        env.add_template(EMAIL_TEMPLATE_NAME, EMAIL_TEMPLATE)
            .map_err(render_error)?;
        let entries: Vec<EmailEntry> = papers.iter().map(EmailEntry::from).collect();

        env.get_template(EMAIL_TEMPLATE_NAME)
            .and_then(|template| template.render(context! { papers => entries }))
            .map_err(render_error)
    }

    fn build_message(&self, papers: &[Paper], tag: &str) -> Result<Message> {
        let message = Message::builder()
            .from(self.config.sender_email.parse().map_err(|e| self.error(e))?)
            .to(self.config.receiver_email.parse().map_err(|e| self.error(e))?)
            .subject(Self::build_subject(tag, &today()))
            .header(ContentType::TEXT_HTML)
            .body(Self::build_html(papers)?)
            .map_err(|e| self.error(e))?;
        Ok(message)
    }

    fn error(&self, e: impl ToString) -> AppError {
        AppError::Notify {
            channel: "email",
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn post(&self, papers: &[Paper], tag: &str) -> Result<()> {
        if papers.is_empty() {
            info!("没有需要发送邮件的论文");
            return Ok(());
        }

        info!("📧 正在发送包含 {} 篇论文的邮件...", papers.len());
        let message = self.build_message(papers, tag)?;

        let credentials = Credentials::new(
            self.config.sender_email.clone(),
            self.config.sender_password.clone(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)
            .map_err(|e| self.error(e))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        let response = mailer.send(message).await.map_err(|e| self.error(e))?;
        info!("✓ 邮件发送成功 (SMTP {})", response.code());
        Ok(())
    }
}
