pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::drafts::handlers as drafts;
use crate::entries::handlers as entries;
use crate::prompts::handlers as prompts;
use crate::state::AppState;
use crate::storage::handlers as uploads;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Blob upload gateway
        .route("/upload-audio", post(uploads::handle_upload_audio))
        .route("/upload-image", post(uploads::handle_upload_image))
        // Prompts
        .route("/api/v1/prompts/random", get(prompts::handle_random_prompt))
        .route("/api/v1/prompts/trial", get(prompts::handle_trial_prompt))
        // Entries
        .route(
            "/api/v1/entries",
            get(entries::handle_list_entries).post(entries::handle_create_entry),
        )
        .route("/api/v1/entries/:id", get(entries::handle_get_entry))
        // Pending-draft hand-off
        .route("/api/v1/drafts", post(drafts::handle_create_pending_draft))
        .route(
            "/api/v1/drafts/:token/claim",
            post(drafts::handle_claim_pending_draft),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
