use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::upload::{AudioUploadResponse, ImageUploadResponse};
use crate::state::AppState;
use crate::storage::gateway::{self, AudioFile};

#[derive(Debug, Deserialize)]
pub struct ImageUploadQuery {
    pub filename: Option<String>,
}

/// POST /upload-audio
///
/// Multipart form with a single `file` field holding the recording.
pub async fn handle_upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AudioUploadResponse>, AppError> {
    let mut file: Option<AudioFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("audio-{}.webm", chrono::Utc::now().timestamp_millis()));
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Could not read audio file: {e}")))?;
        file = Some(AudioFile {
            filename,
            content_type,
            data,
        });
        break;
    }

    let file = file.ok_or_else(|| AppError::InvalidInput("No audio file provided".to_string()))?;
    let response = gateway::upload_audio(state.blobs.as_ref(), file).await?;
    Ok(Json(response))
}

/// POST /upload-image?filename=<name>
///
/// Raw request body; the `Content-Type` header becomes the stored content type.
pub async fn handle_upload_image(
    State(state): State<AppState>,
    Query(query): Query<ImageUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageUploadResponse>, AppError> {
    let filename = query
        .filename
        .ok_or_else(|| AppError::InvalidInput("Filename is required".to_string()))?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let response =
        gateway::upload_image(state.blobs.as_ref(), body, &filename, content_type).await?;
    Ok(Json(response))
}
