/// arXiv API 客户端
///
/// 封装元数据查询（Atom 接口）和源码包下载（e-print 接口）
use crate::clients::repository::{PaperRepository, SourceRef};
use crate::error::{AppError, ScanError, ScanResult};
use crate::models::{normalize_paper_id, Paper};
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://export.arxiv.org/api/query";
const DEFAULT_EPRINT_BASE: &str = "https://arxiv.org/e-print";
const USER_AGENT: &str = "arxiv-daily-bot/0.1";

/// arXiv 客户端
#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    api_base: String,
    eprint_base: String,
}

impl ArxivClient {
    /// 创建默认客户端
    pub fn new() -> Result<Self> {
        Self::with_bases(DEFAULT_API_BASE, DEFAULT_EPRINT_BASE)
    }

    /// 使用自定义接口地址创建
    pub fn with_bases(api_base: impl Into<String>, eprint_base: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            eprint_base: eprint_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// 抓取某个分类下最新提交的论文
    ///
    /// # 参数
    /// - `category`: 分类，如 `cs.CR`
    /// - `max_results`: 最大数量
    pub async fn latest_papers(&self, category: &str, max_results: usize) -> Result<Vec<Paper>> {
        info!("📥 正在抓取 arXiv 分类: {}", category);
        let search_query = format!("cat:{}", category);
        let max_results = max_results.to_string();
        let text = self
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .await?;
        let papers = parse_atom_feed(&text)?;
        debug!("分类 {} 返回 {} 篇论文", category, papers.len());
        Ok(papers)
    }

    /// 按 ID 查询单篇论文元数据
    pub async fn lookup(&self, paper_id: &str) -> Result<Option<Paper>> {
        let text = self
            .query(&[("id_list", paper_id), ("max_results", "1")])
            .await?;
        Ok(parse_atom_feed(&text)?.into_iter().next())
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<String> {
        let resp = self
            .http
            .get(&self.api_base)
            .query(params)
            .header(ACCEPT, "application/atom+xml, application/xml;q=0.9")
            .send()
            .await
            .context("arXiv API 请求失败")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Arxiv(format!("HTTP {}", status)).into());
        }
        resp.text().await.context("读取 arXiv API 响应失败")
    }

    fn source_url(&self, paper_id: &str) -> String {
        format!("{}/{}", self.eprint_base, paper_id)
    }
}

#[async_trait]
impl PaperRepository for ArxivClient {
    async fn resolve(&self, paper_id: &str) -> ScanResult<SourceRef> {
        let found = self
            .lookup(paper_id)
            .await
            .map_err(|e| ScanError::Download {
                paper_id: paper_id.to_string(),
                message: format!("{:#}", e),
            })?;

        match found {
            Some(paper) => Ok(SourceRef {
                source_url: self.source_url(&paper.id),
                paper_id: paper.id,
            }),
            None => Err(ScanError::NotFound {
                paper_id: paper_id.to_string(),
            }),
        }
    }

    async fn download_source(&self, source: &SourceRef, dir: &Path) -> ScanResult<PathBuf> {
        let download_err = |message: String| ScanError::Download {
            paper_id: source.paper_id.clone(),
            message,
        };

        debug!("下载源码包: {}", source.source_url);
        let resp = self
            .http
            .get(&source.source_url)
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ScanError::NoSource {
                paper_id: source.paper_id.clone(),
            });
        }
        if !status.is_success() {
            return Err(download_err(format!("HTTP {}", status)));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("pdf") || content_type.contains("html") {
            return Err(ScanError::NoSource {
                paper_id: source.paper_id.clone(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| download_err(e.to_string()))?;
        if bytes.is_empty() {
            return Err(download_err("响应为空".to_string()));
        }

        let path = dir.join(format!("{}.tar.gz", source.paper_id.replace('/', "_")));
        tokio::fs::write(&path, &bytes).await?;
        debug!("源码包已保存: {} ({} 字节)", path.display(), bytes.len());
        Ok(path)
    }
}

#[derive(Default)]
struct EntryFields {
    id: String,
    title: String,
    summary: String,
    published: String,
}

#[derive(Clone, Copy)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
}

/// 解析 Atom 响应
///
/// 错误条目（id 指向 `api/errors`）会被丢弃。
pub fn parse_atom_feed(xml: &str) -> Result<Vec<Paper>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut entry: Option<EntryFields> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event().context("Atom XML 解析失败")? {
            Event::Start(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"entry" => entry = Some(EntryFields::default()),
                    b"id" if entry.is_some() => field = Some(Field::Id),
                    b"title" if entry.is_some() => field = Some(Field::Title),
                    b"summary" if entry.is_some() => field = Some(Field::Summary),
                    b"published" if entry.is_some() => field = Some(Field::Published),
                    _ => field = None,
                }
            }
            Event::Text(t) => {
                if let (Some(current), Some(f)) = (entry.as_mut(), field) {
                    let text = t.unescape().context("Atom 文本反转义失败")?;
                    let target = match f {
                        Field::Id => &mut current.id,
                        Field::Title => &mut current.title,
                        Field::Summary => &mut current.summary,
                        Field::Published => &mut current.published,
                    };
                    target.push_str(&text);
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"entry" {
                    if let Some(done) = entry.take() {
                        if let Some(paper) = entry_to_paper(done) {
                            papers.push(paper);
                        }
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(papers)
}

fn entry_to_paper(entry: EntryFields) -> Option<Paper> {
    if entry.id.is_empty() || entry.id.contains("api/errors") {
        return None;
    }

    let short_id = entry
        .id
        .split("/abs/")
        .nth(1)
        .unwrap_or(&entry.id)
        .trim()
        .to_string();

    Some(Paper::new(
        &normalize_paper_id(&short_id),
        collapse_whitespace(&entry.title),
        entry.summary.replace('\n', " ").trim().to_string(),
        entry.id.trim(),
        published_date(&entry.published),
    ))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn published_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.trim().chars().take(10).collect())
}
