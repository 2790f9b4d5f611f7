//! Chat Routes
//!
//! 对话相关的 API 路由。

use crate::api::handlers::chat_handler::*;
use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::api::app_state::AppState;

/// 创建对话路由器
pub fn create_chat_router() -> Router<AppState> {
    Router::new()
        .route(
            "/personas/:id/conversation",
            get(get_conversation).delete(reset_conversation),
        )
        .route("/personas/:id/conversation/messages", post(send_message))
        .route(
            "/personas/:id/conversation/messages/:message_id",
            delete(delete_message),
        )
}
