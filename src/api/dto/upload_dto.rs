//! 上传 DTO

use serde::{Deserialize, Serialize};

use crate::models::upload::BookStatus;

/// multipart 中承载书籍的字段名
pub const UPLOAD_FIELD: &str = "files";

/// 书籍状态响应
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadStatusResponse {
    pub books: Vec<BookStatus>,
}
