use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::prompt::Prompt;
use crate::prompts::fallback::random_trial_prompt;
use crate::prompts::random_prompt;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TrialPromptResponse {
    pub text: String,
}

/// GET /api/v1/prompts/random
///
/// Errors are returned as-is; falling back to the local set is the client's call.
pub async fn handle_random_prompt(State(state): State<AppState>) -> Result<Json<Prompt>, AppError> {
    let prompt = random_prompt(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No prompts available".to_string()))?;
    Ok(Json(prompt))
}

/// GET /api/v1/prompts/trial
pub async fn handle_trial_prompt() -> Json<TrialPromptResponse> {
    Json(TrialPromptResponse {
        text: random_trial_prompt().to_string(),
    })
}
