use axum::{extract::State, Json};
use serde::Serialize;

use crate::models::upload::MAX_IMAGE_BYTES;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    /// Largest request body the upload routes accept.
    pub max_upload_bytes: usize,
    pub max_image_bytes: u64,
}

/// GET /health
///
/// Liveness only; the database and object store are not checked.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        service: "journal-api",
        max_upload_bytes: state.config.max_upload_bytes,
        max_image_bytes: MAX_IMAGE_BYTES,
    })
}
