//! 书籍上传与入库
//!
//! 上传的 PDF/EPUB 先全部写入书籍目录，再逐个提取文本、分块、识别病症并写入知识库。
//! 写盘失败的文件记入 rejected；处理失败只标记该文件为 error，均不影响其余文件。

pub mod chunker;
pub mod extractor;

pub use chunker::{KNOWN_CONDITIONS, build_entries, detect_conditions, split_sections};
pub use extractor::{BookTextExtractor, TextExtractor};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AppError, Result};
use crate::index::KnowledgeRetriever;
use crate::models::upload::{BookFormat, BookStatus, UploadStatus, sanitize_filename};
use crate::observability::AppMetrics;
use crate::storage::upload_status::UploadStatusStore;

/// 一个上传的文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// 客户端提供的原始文件名
    pub filename: String,
    pub content: Vec<u8>,
}

/// 被拒绝的文件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedFile {
    pub filename: String,
    pub reason: String,
}

/// 单个文件的处理结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileOutcome {
    pub filename: String,
    pub status: UploadStatus,
    pub entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一次上传的汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadReport {
    pub saved: Vec<String>,
    pub rejected: Vec<RejectedFile>,
    pub processed: Vec<FileOutcome>,
}

#[async_trait]
pub trait IngestionService: Send + Sync {
    /// 保存并处理一批文件
    async fn ingest(&self, files: Vec<UploadedFile>) -> Result<UploadReport>;

    /// 当前书籍处理状态
    async fn status(&self) -> Result<Vec<BookStatus>>;
}

pub struct IngestionServiceImpl {
    books_dir: PathBuf,
    min_chunk_chars: usize,
    statuses: Arc<UploadStatusStore>,
    extractor: Box<dyn TextExtractor>,
    knowledge: Arc<dyn KnowledgeRetriever>,
    metrics: Arc<AppMetrics>,
}

impl IngestionServiceImpl {
    pub fn new(
        books_dir: impl Into<PathBuf>,
        statuses: Arc<UploadStatusStore>,
        extractor: Box<dyn TextExtractor>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            books_dir: books_dir.into(),
            min_chunk_chars: 50,
            statuses,
            extractor,
            knowledge,
            metrics,
        }
    }

    pub fn with_min_chunk_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// 校验文件名与格式，返回清理后的文件名
    fn accept(file: &UploadedFile) -> std::result::Result<(String, BookFormat), String> {
        let filename = sanitize_filename(&file.filename).ok_or("invalid file name")?;
        let format = BookFormat::from_filename(&filename)
            .ok_or("unsupported file type, only PDF and EPUB are accepted")?;
        if file.content.is_empty() {
            return Err("file is empty".to_string());
        }
        Ok((filename, format))
    }

    async fn process(&self, filename: &str, format: BookFormat) -> Result<usize> {
        let path = self.books_dir.join(filename);
        self.statuses
            .update(filename, UploadStatus::Processing, None, Some(10));

        let text = self.extractor.extract(&path, format).await?;
        self.statuses
            .update(filename, UploadStatus::Processing, None, Some(40));

        let source = source_name(filename);
        let entries = build_entries(&source, &text, self.min_chunk_chars);
        if entries.is_empty() {
            return Err(AppError::Validation(format!(
                "no usable text found in {}",
                filename
            )));
        }
        self.statuses
            .update(filename, UploadStatus::Processing, None, Some(70));

        self.knowledge.add_entries(entries).await
    }
}

/// 去掉扩展名后的文件名，作为知识条目的来源
fn source_name(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
        .to_string()
}

#[async_trait]
impl IngestionService for IngestionServiceImpl {
    async fn ingest(&self, files: Vec<UploadedFile>) -> Result<UploadReport> {
        if files.is_empty() {
            return Err(AppError::Validation("no files uploaded".to_string()));
        }

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for file in &files {
            match Self::accept(file) {
                Ok(ok) => accepted.push((ok, file)),
                Err(reason) => {
                    warn!(filename = %file.filename, %reason, "Upload rejected");
                    rejected.push(RejectedFile {
                        filename: file.filename.clone(),
                        reason,
                    });
                }
            }
        }

        if accepted.is_empty() {
            let listing = rejected
                .iter()
                .map(|r| format!("{} ({})", r.filename, r.reason))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::Validation(format!(
                "no supported files uploaded: {}",
                listing
            )));
        }

        tokio::fs::create_dir_all(&self.books_dir).await?;
        let mut saved = Vec::new();
        for ((filename, format), file) in accepted {
            let target = self.books_dir.join(&filename);
            if let Err(e) = tokio::fs::write(&target, &file.content).await {
                error!(%filename, error = %e, "Failed to save book");
                self.metrics.record_file(false);
                rejected.push(RejectedFile {
                    filename,
                    reason: format!("failed to save file: {}", e),
                });
                continue;
            }
            self.statuses
                .update(&filename, UploadStatus::Pending, None, Some(0));
            saved.push((filename, format));
        }
        info!(saved = saved.len(), rejected = rejected.len(), "Books saved");

        if saved.is_empty() {
            return Err(AppError::Io(format!(
                "none of the uploaded files could be saved to {}",
                self.books_dir.display()
            )));
        }

        let mut processed = Vec::with_capacity(saved.len());
        for (filename, format) in &saved {
            let outcome = match self.process(filename, *format).await {
                Ok(entries) => {
                    self.statuses
                        .update(filename, UploadStatus::Completed, None, Some(100));
                    self.metrics.record_file(true);
                    info!(%filename, entries, "Book ingested");
                    FileOutcome {
                        filename: filename.clone(),
                        status: UploadStatus::Completed,
                        entries,
                        error: None,
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    self.statuses
                        .update(filename, UploadStatus::Error, Some(message.clone()), None);
                    self.metrics.record_file(false);
                    error!(%filename, error = %message, "Book ingestion failed");
                    FileOutcome {
                        filename: filename.clone(),
                        status: UploadStatus::Error,
                        entries: 0,
                        error: Some(message),
                    }
                }
            };
            processed.push(outcome);
        }

        Ok(UploadReport {
            saved: saved.into_iter().map(|(filename, _)| filename).collect(),
            rejected,
            processed,
        })
    }

    async fn status(&self) -> Result<Vec<BookStatus>> {
        self.statuses.snapshot(&self.books_dir).await
    }
}

pub fn create_ingestion_service(
    books_dir: impl Into<PathBuf>,
    min_chunk_chars: usize,
    statuses: Arc<UploadStatusStore>,
    knowledge: Arc<dyn KnowledgeRetriever>,
    metrics: Arc<AppMetrics>,
) -> Box<dyn IngestionService> {
    Box::new(
        IngestionServiceImpl::new(
            books_dir,
            statuses,
            Box::new(BookTextExtractor::new()),
            knowledge,
            metrics,
        )
        .with_min_chunk_chars(min_chunk_chars),
    )
}
