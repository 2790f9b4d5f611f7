use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
};
use tracing::{debug, info};

use crate::{
    api::{app_state::AppState, dto::upload_dto::*},
    error::AppError,
    services::ingestion::UploadedFile,
};

/// 接收 multipart 上传的书籍并立即入库
pub async fn upload_books(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?.to_vec();
        files.push(UploadedFile { filename, content });
    }

    info!("Received {} uploaded file(s)", files.len());
    let report = state.ingestion_service.ingest(files).await?;
    Ok(Json(report))
}

pub async fn upload_status(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let books = state.ingestion_service.status().await?;
    Ok(Json(UploadStatusResponse { books }))
}
