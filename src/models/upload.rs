use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 书籍格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Pdf,
    Epub,
}

impl BookFormat {
    /// 按扩展名识别格式（忽略大小写）
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(BookFormat::Pdf),
            "epub" => Some(BookFormat::Epub),
            _ => None,
        }
    }
}

/// 处理状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// 状态记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadStatusEntry {
    pub status: UploadStatus,
    pub error: Option<String>,
    /// 进度百分比
    pub progress: Option<u8>,
    /// 最后更新时间，用于过期清理
    pub updated_at: DateTime<Utc>,
}

/// 单个文件的状态视图
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookStatus {
    pub filename: String,
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

/// 只保留路径最后一段，防止目录穿越
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}
