use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::Result;
use crate::models::upload::{BookFormat, BookStatus, UploadStatus, UploadStatusEntry};

/// 上传处理状态表
///
/// 由调用方持有并注入，不是全局单例。过期清理只在读取时进行。
pub struct UploadStatusStore {
    entries: RwLock<HashMap<String, UploadStatusEntry>>,
    ttl: Duration,
}

impl UploadStatusStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1)),
        }
    }

    /// 写入一条状态，时间戳取当前时间
    pub fn update(
        &self,
        filename: &str,
        status: UploadStatus,
        error: Option<String>,
        progress: Option<u8>,
    ) {
        self.update_at(filename, status, error, progress, Utc::now());
    }

    pub fn update_at(
        &self,
        filename: &str,
        status: UploadStatus,
        error: Option<String>,
        progress: Option<u8>,
        now: DateTime<Utc>,
    ) {
        self.entries.write().insert(
            filename.to_string(),
            UploadStatusEntry {
                status,
                error,
                progress: progress.map(|p| p.min(100)),
                updated_at: now,
            },
        );
    }

    pub fn get(&self, filename: &str) -> Option<UploadStatusEntry> {
        self.entries.read().get(filename).cloned()
    }

    /// 读取目录中的书籍并返回状态快照
    pub async fn snapshot(&self, books_dir: &Path) -> Result<Vec<BookStatus>> {
        let present = list_book_files(books_dir).await?;
        Ok(self.snapshot_at(Utc::now(), &present))
    }

    /// 先为磁盘上尚无记录的书籍登记 pending，再清理过期或已不存在的条目
    pub fn snapshot_at(&self, now: DateTime<Utc>, present: &BTreeSet<String>) -> Vec<BookStatus> {
        let mut entries = self.entries.write();

        for filename in present {
            entries
                .entry(filename.clone())
                .or_insert_with(|| UploadStatusEntry {
                    status: UploadStatus::Pending,
                    error: None,
                    progress: None,
                    updated_at: now,
                });
        }

        let cutoff = now - self.ttl;
        entries.retain(|filename, entry| entry.updated_at >= cutoff && present.contains(filename));

        let mut books: Vec<BookStatus> = entries
            .iter()
            .map(|(filename, entry)| BookStatus {
                filename: filename.clone(),
                status: entry.status,
                error: entry.error.clone(),
                progress: entry.progress,
            })
            .collect();
        books.sort_by(|a, b| a.filename.cmp(&b.filename));
        books
    }
}

/// 列出目录中的 PDF/EPUB 文件名；目录不存在时视为空
pub async fn list_book_files(books_dir: &Path) -> Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();
    let mut dir = match tokio::fs::read_dir(books_dir).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = dir.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if BookFormat::from_filename(name).is_some() {
                files.insert(name.to_string());
            }
        }
    }
    Ok(files)
}
