use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::search_dto::*},
    error::AppError,
};

/// 直接检索知识库，供运维排查
pub async fn search_knowledge(
    State(state): State<AppState>,
    params: Result<Query<KnowledgeSearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    if params.condition.trim().is_empty() || params.query.trim().is_empty() {
        return Err(AppError::Validation(
            "both condition and query are required".to_string(),
        ));
    }

    let limit = params
        .limit
        .unwrap_or(state.config.knowledge.result_limit)
        .clamp(1, MAX_SEARCH_LIMIT);
    debug!(
        "Knowledge search: condition={}, query={}, limit={}",
        params.condition, params.query, limit
    );

    let results = state
        .knowledge
        .query(&params.condition, &params.query, limit)
        .await?;

    Ok(Json(KnowledgeSearchResponse {
        total: results.len(),
        condition: params.condition,
        query: params.query,
        results,
    }))
}
