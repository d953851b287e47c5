use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entries::repository::{insert_entry, prepare_entry, MAX_TITLE_CHARS};
use crate::errors::AppError;
use crate::models::draft::{PendingDraft, PendingDraftRequest, PendingDraftResponse};
use crate::models::entry::{JournalEntryRow, NewEntryRequest};
use crate::state::AppState;

/// POST /api/v1/drafts
///
/// No session needed. The returned token goes through the sign-in redirect.
pub async fn handle_create_pending_draft(
    State(state): State<AppState>,
    Json(request): Json<PendingDraftRequest>,
) -> Result<(StatusCode, Json<PendingDraftResponse>), AppError> {
    let draft = PendingDraft {
        prompt_text: trimmed(request.prompt_text),
        title: trimmed(request.title),
        content: trimmed(request.content),
        created_at: Utc::now(),
    };
    if draft.content.is_none() {
        return Err(AppError::EmptyEntry);
    }
    if draft
        .title
        .as_deref()
        .is_some_and(|t| t.chars().count() > MAX_TITLE_CHARS)
    {
        return Err(AppError::InvalidInput(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    let token = Uuid::new_v4();
    state.drafts.put(token, &draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(PendingDraftResponse {
            token,
            redirect_path: format!("/login?pending_draft={token}"),
        }),
    ))
}

/// POST /api/v1/drafts/:token/claim
///
/// Persists the parked draft for the signed-in user. A failed insert puts the draft
/// back so the claim can be repeated.
pub async fn handle_claim_pending_draft(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(token): Path<Uuid>,
) -> Result<(StatusCode, Json<JournalEntryRow>), AppError> {
    let draft = state
        .drafts
        .take(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Pending draft not found or expired".to_string()))?;

    let request = NewEntryRequest {
        title: draft.title.clone(),
        content: draft.content.clone(),
        ..Default::default()
    };
    let entry = prepare_entry(user.id, request, Utc::now())?;

    match insert_entry(&state.db, &entry).await {
        Ok(row) => {
            info!("Claimed pending draft {token} as entry {}", row.id);
            Ok((StatusCode::CREATED, Json(row)))
        }
        Err(e) => {
            if let Err(restore) = state.drafts.put(token, &draft).await {
                warn!("Could not restore pending draft {token}: {restore}");
            }
            Err(e)
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
