use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::persona_dto::*},
    error::AppError,
    models::persona::Persona,
};

pub async fn list_personas(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let personas = state.persona_service.list().await?;
    Ok(Json(PersonaListResponse::from(personas)))
}

pub async fn create_persona(
    State(state): State<AppState>,
    payload: Result<Json<Persona>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(persona) = payload?;
    debug!("Creating persona: {}", persona.name);

    let created = state.persona_service.create(persona).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn generate_persona(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let generated = state.persona_service.generate().await?;
    debug!("Generated persona: {} ({})", generated.id, generated.condition);
    Ok((StatusCode::CREATED, Json(generated)))
}

pub async fn get_persona(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let persona = state.persona_service.get(&id).await?;
    Ok(Json(persona))
}

pub async fn update_persona(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Persona>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(persona) = payload?;
    debug!("Updating persona: {}", id);

    let updated = state.persona_service.update(&id, persona).await?;
    Ok(Json(updated))
}

pub async fn delete_persona(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting persona: {}", id);
    state.persona_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
