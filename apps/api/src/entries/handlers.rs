use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entries::repository::{get_entry, insert_entry, list_entries, prepare_entry, summarize};
use crate::errors::AppError;
use crate::models::entry::{EntrySummary, JournalEntryRow, NewEntryRequest};
use crate::state::AppState;

/// POST /api/v1/entries
///
/// Validation runs before the store is touched, so an empty entry never reaches it.
pub async fn handle_create_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<NewEntryRequest>,
) -> Result<(StatusCode, Json<JournalEntryRow>), AppError> {
    let entry = prepare_entry(user.id, request, Utc::now())?;
    let row = insert_entry(&state.db, &entry).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/entries
pub async fn handle_list_entries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<EntrySummary>>, AppError> {
    let rows = list_entries(&state.db, user.id).await?;
    Ok(Json(rows.into_iter().map(summarize).collect()))
}

/// GET /api/v1/entries/:id
pub async fn handle_get_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<EntrySummary>, AppError> {
    let row = get_entry(&state.db, user.id, entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {entry_id} not found")))?;
    Ok(Json(summarize(row)))
}
