//! Upload Routes
//!
//! 书籍上传与知识检索路由。

use crate::api::handlers::{knowledge_handler::*, upload_handler::*};
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建上传路由器
pub fn create_upload_router() -> Router<AppState> {
    Router::new()
        .route("/uploads", post(upload_books))
        .route("/uploads/status", get(upload_status))
}

/// 创建知识检索路由器
pub fn create_knowledge_router() -> Router<AppState> {
    Router::new().route("/knowledge/search", get(search_knowledge))
}
