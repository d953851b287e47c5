pub mod fallback;
pub mod handlers;

use sqlx::PgPool;

use crate::db::classify_store_error;
use crate::errors::AppError;
use crate::models::prompt::Prompt;

/// One prompt picked uniformly at random, or `None` when the table is empty.
pub async fn random_prompt(pool: &PgPool) -> Result<Option<Prompt>, AppError> {
    sqlx::query_as::<_, Prompt>("SELECT id, text, category FROM prompts ORDER BY random() LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            classify_store_error(e, |message| {
                AppError::Internal(anyhow::anyhow!("Unable to load prompt: {message}"))
            })
        })
}
