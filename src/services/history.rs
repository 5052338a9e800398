//! 历史记录 - 已推送论文的 JSON 存档
//!
//! 文件内容为 `Paper` 数组，最新的在前。

use crate::error::{AppError, AppResult};
use crate::models::Paper;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 读取已处理过的论文 ID
    ///
    /// 文件不存在或损坏时返回空集合。
    pub fn load_processed_ids(&self) -> HashSet<String> {
        self.load_records()
            .into_iter()
            .map(|p| p.id)
            .collect()
    }

    /// 把新论文追加到历史记录最前面
    pub fn save(&self, papers: &[Paper]) -> AppResult<()> {
        let mut combined = papers.to_vec();
        combined.extend(self.load_records());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AppError::history(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&combined)
            .map_err(|e| AppError::history(&self.path, e))?;
        std::fs::write(&self.path, json).map_err(|e| AppError::history(&self.path, e))?;

        info!(
            "💾 历史记录已保存: 新增 {} 篇，共 {} 篇 ({})",
            papers.len(),
            combined.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load_records(&self) -> Vec<Paper> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("历史记录不可读 ({}): {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Paper>>(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "⚠️ 历史记录文件损坏，按空记录处理 ({}): {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }
}
