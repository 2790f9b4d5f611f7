use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::debug;

use crate::{api::app_state::AppState, error::AppError, services::chat::ChatTurnRequest};

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(persona_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.chat_service.conversation(&persona_id).await?;
    Ok(Json(snapshot))
}

/// 开始新对话
pub async fn reset_conversation(
    State(state): State<AppState>,
    Path(persona_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Resetting conversation: {}", persona_id);
    let snapshot = state.chat_service.reset(&persona_id).await?;
    Ok(Json(snapshot))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(persona_id): Path<String>,
    payload: Result<Json<ChatTurnRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    debug!(
        "Sending message to {} ({} chars, {:?})",
        persona_id,
        request.text.chars().count(),
        request.language
    );

    let result = state.chat_service.send(&persona_id, request).await?;
    Ok(Json(result))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path((persona_id, message_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting message {} from {}", message_id, persona_id);
    let snapshot = state
        .chat_service
        .delete_message(&persona_id, &message_id)
        .await?;
    Ok(Json(snapshot))
}
