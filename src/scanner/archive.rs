//! 源码包解压
//!
//! arXiv 的 e-print 可能是 tar、tar.gz、gzip 压缩的单个 .tex，也可能直接是 PDF。
//! 只有前三种会被解压，其余报告为"不是归档"。

use crate::error::{ScanError, ScanResult};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;
use tar::{Archive, Header};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TAR_BLOCK: usize = 512;

/// 解压结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// tar 包已完整解压
    Unpacked,
    /// gzip 压缩的单个文件，已写为一个 .tex
    SingleFile,
    /// 不是可识别的归档
    NotArchive,
}

/// 将源码包解压到 `dest`
///
/// `dest` 必须已存在且归本次扫描独占。解压失败时返回错误，调用方不应信任半解压的目录。
pub fn extract_bundle(bundle: &Path, dest: &Path) -> ScanResult<Extraction> {
    let raw = fs::read(bundle)?;

    let payload = if raw.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|source| ScanError::ArchiveUnreadable {
                path: bundle.to_path_buf(),
                source,
            })?;
        debug!("gzip 解压完成: {} → {} 字节", raw.len(), decoded.len());

        if !looks_like_tar(&decoded) {
            let name = bundle
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(".tar"))
                .filter(|s| !s.is_empty())
                .unwrap_or("main");
            fs::write(dest.join(format!("{}.tex", name)), &decoded)?;
            return Ok(Extraction::SingleFile);
        }
        decoded
    } else if looks_like_tar(&raw) {
        raw
    } else {
        return Ok(Extraction::NotArchive);
    };

    // tar 的 unpack 会跳过包含 `..` 或绝对路径的条目
    Archive::new(payload.as_slice())
        .unpack(dest)
        .map_err(|source| ScanError::ArchiveUnreadable {
            path: bundle.to_path_buf(),
            source,
        })?;

    Ok(Extraction::Unpacked)
}

/// 判断字节流是否以合法的 tar 头开始
///
/// 优先看 ustar 标记，老式 v7 包退回到校验和比对。
fn looks_like_tar(bytes: &[u8]) -> bool {
    if bytes.len() < TAR_BLOCK {
        return false;
    }
    if &bytes[257..262] == b"ustar" {
        return true;
    }

    let header = Header::from_byte_slice(&bytes[..TAR_BLOCK]);
    let stored = match header.cksum() {
        Ok(sum) => sum,
        Err(_) => return false,
    };
    let mut recomputed = header.clone();
    recomputed.set_cksum();
    recomputed.cksum().map(|sum| sum == stored).unwrap_or(false)
}
