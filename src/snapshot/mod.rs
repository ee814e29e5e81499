//! # 快照模块
//!
//! 负责把捕获结果持久化到目标目录，并维护本次运行的错误日志：
//!
//! - 文档与资源文件的写入（先写临时文件再重命名，被取消的运行
//!   不会留下半写状态的文件）
//! - 追加式错误日志，并发追加经互斥锁串行化，最终刷出为 `errors.md`
//!
//! 单个文件的写入失败只记录并跳过；唯一致命的条件是目标目录本身
//! 无法创建，由调用方决定终止。

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::assets::FetchedAsset;

/// 错误日志文件名
pub const ERROR_LOG_FILE_NAME: &str = "errors.md";

/// 资源子目录名
pub const ASSETS_DIR_NAME: &str = "assets";

/// 一条错误记录
///
/// `subject` 是出错的标识（URL 或节点定位），`message` 说明原因。
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    fn to_markdown_line(&self) -> String {
        format!(
            "- {} **{}**: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.subject,
            self.message
        )
    }
}

/// 本次捕获运行的追加式错误日志
///
/// 运行期间积累在内存里，结束时（包括失败终止前）刷出为 markdown
/// 文件。没有错误就不产生文件。
#[derive(Debug, Default)]
pub struct ErrorLog {
    records: Mutex<Vec<ErrorRecord>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录；并发调用经锁串行化
    pub async fn record(&self, subject: impl Into<String>, message: impl Into<String>) {
        let record = ErrorRecord {
            subject: subject.into(),
            message: message.into(),
            timestamp: Utc::now(),
        };
        warn!(subject = %record.subject, "{}", record.message);
        self.records.lock().await.push(record);
    }

    pub async fn count(&self) -> usize {
        self.records.lock().await.len()
    }

    /// 把积累的记录刷出为 `errors.md`
    ///
    /// 没有记录时不创建任何文件或目录，返回 `Ok(None)`。
    pub async fn flush(&self, destination: &Path) -> io::Result<Option<PathBuf>> {
        let records = self.records.lock().await;
        if records.is_empty() {
            return Ok(None);
        }

        let mut contents = String::from("# Capture errors\n\n");
        for record in records.iter() {
            contents.push_str(&record.to_markdown_line());
            contents.push('\n');
        }

        tokio::fs::create_dir_all(destination).await?;
        let path = destination.join(ERROR_LOG_FILE_NAME);
        tokio::fs::write(&path, contents).await?;
        Ok(Some(path))
    }
}

/// 快照写入器
///
/// 面向一个捕获目录：文档写在根部，资源写进 `assets/` 子目录。
pub struct SnapshotWriter {
    root: PathBuf,
}

impl SnapshotWriter {
    /// 确保目标目录存在（幂等）
    ///
    /// 创建失败是整个运行唯一的致命写入条件，错误原样上抛。
    pub async fn prepare(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 写入全部资源文件，返回成功写入的数量
    ///
    /// 每个文件名只写一次（重复名来自内容哈希去重，跳过即复用）。
    /// 单个文件的失败记录后跳过。
    pub async fn write_assets(&self, assets: &[FetchedAsset], error_log: &ErrorLog) -> usize {
        if assets.is_empty() {
            return 0;
        }

        let assets_dir = self.root.join(ASSETS_DIR_NAME);
        if let Err(error) = tokio::fs::create_dir_all(&assets_dir).await {
            error_log
                .record("assets directory", format!("failed to create: {error}"))
                .await;
            return 0;
        }

        let mut written: HashSet<&str> = HashSet::new();
        let mut count = 0usize;
        for asset in assets {
            let file_name = asset.reference.local_file_name.as_str();
            if !written.insert(file_name) {
                continue;
            }

            match write_file_atomically(&assets_dir.join(file_name), &asset.bytes).await {
                Ok(()) => {
                    debug!(file = file_name, size = asset.bytes.len(), "asset written");
                    count += 1;
                }
                Err(error) => {
                    error_log
                        .record(file_name, format!("failed to write: {error}"))
                        .await;
                }
            }
        }

        count
    }

    /// 把一个文档写到捕获目录根部
    pub async fn write_document(&self, file_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.root.join(file_name);
        write_file_atomically(&path, contents).await?;
        Ok(path)
    }
}

/// 先写临时文件再重命名
///
/// 运行被取消时不会留下半写状态的目标文件。
async fn write_file_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".part");
    let temp_path = PathBuf::from(temp_name);

    tokio::fs::write(&temp_path, contents).await?;
    tokio::fs::rename(&temp_path, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetKeyResolver, FetchedAsset};
    use crate::utils::url::Url;

    fn fetched(raw: &str, bytes: &[u8]) -> FetchedAsset {
        let base = Url::parse("https://example.com/").unwrap();
        let mut resolver = AssetKeyResolver::new();
        FetchedAsset {
            reference: resolver.resolve(raw, &base).unwrap(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_assets_land_in_assets_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::prepare(dir.path().join("run")).await.unwrap();
        let error_log = ErrorLog::new();

        let count = writer
            .write_assets(
                &[fetched("/style.css", b"body{}"), fetched("/app.js", b";")],
                &error_log,
            )
            .await;

        assert_eq!(count, 2);
        let css = std::fs::read(dir.path().join("run/assets/style.css")).unwrap();
        assert_eq!(css, b"body{}");
        assert_eq!(error_log.count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_file_names_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::prepare(dir.path().join("run")).await.unwrap();
        let error_log = ErrorLog::new();

        let asset = fetched("/style.css", b"body{}");
        let count = writer
            .write_assets(&[asset.clone(), asset], &error_log)
            .await;

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_no_part_files_remain_after_writes() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::prepare(dir.path().join("run")).await.unwrap();

        writer
            .write_document("webpage.html", b"<html></html>")
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("run"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_flush_skips_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("run");
        let error_log = ErrorLog::new();

        let flushed = error_log.flush(&destination).await.unwrap();
        assert!(flushed.is_none());
        // 空日志连目录都不创建
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_flush_writes_markdown_lines() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("run");
        let error_log = ErrorLog::new();
        error_log
            .record("https://example.com/gone.css", "HTTP status 404")
            .await;

        let flushed = error_log.flush(&destination).await.unwrap().unwrap();
        let contents = std::fs::read_to_string(flushed).unwrap();

        assert!(contents.starts_with("# Capture errors"));
        assert!(contents.contains("**https://example.com/gone.css**: HTTP status 404"));
    }
}
