//! Persona Routes
//!
//! 病人档案相关的 API 路由。

use crate::api::handlers::persona_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建病人路由器
pub fn create_persona_router() -> Router<AppState> {
    Router::new()
        .route("/personas", get(list_personas).post(create_persona))
        .route("/personas/generate", post(generate_persona))
        .route(
            "/personas/:id",
            get(get_persona).put(update_persona).delete(delete_persona),
        )
}
