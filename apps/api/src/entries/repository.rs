use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::classify_store_error;
use crate::errors::AppError;
use crate::format::{entry_preview, format_date, format_duration, format_time};
use crate::models::entry::{
    EntrySummary, EntryWithPromptRow, JournalEntryRow, NewEntryRequest, PromptRef,
};
use crate::prompts::fallback::fallback_prompt;

pub const MAX_TITLE_CHARS: usize = 255;

/// A validated entry ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub prompt_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub audio_url: Option<String>,
    pub audio_duration: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Normalizes a request (trimmed strings, empty -> null, zero duration -> null) and
/// rejects entries with no text, audio or image.
pub fn prepare_entry(
    user_id: Uuid,
    request: NewEntryRequest,
    now: DateTime<Utc>,
) -> Result<NewEntry, AppError> {
    let content = non_empty(request.content);
    let audio_url = non_empty(request.audio_url);
    let image_url = non_empty(request.image_url);

    if content.is_none() && audio_url.is_none() && image_url.is_none() {
        return Err(AppError::EmptyEntry);
    }

    let title = non_empty(request.title);
    if title
        .as_deref()
        .is_some_and(|t| t.chars().count() > MAX_TITLE_CHARS)
    {
        return Err(AppError::InvalidInput(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    let audio_duration = match request.audio_duration.filter(|d| *d > 0) {
        Some(d) => Some(
            i32::try_from(d)
                .map_err(|_| AppError::InvalidInput("Audio duration is too large".to_string()))?,
        ),
        None => None,
    };

    Ok(NewEntry {
        user_id,
        prompt_id: non_empty(request.prompt_id),
        title,
        content,
        // a duration without audio means nothing
        audio_duration: audio_url.as_ref().and(audio_duration),
        audio_url,
        image_url,
        created_at: now,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Inserts one entry. A missing table or an unreachable store is `StorageUnavailable`.
pub async fn insert_entry(pool: &PgPool, entry: &NewEntry) -> Result<JournalEntryRow, AppError> {
    let row = sqlx::query_as::<_, JournalEntryRow>(
        r#"
        INSERT INTO journal_entries
            (id, user_id, prompt_id, title, content,
             audio_url, audio_duration, image_url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.user_id)
    .bind(&entry.prompt_id)
    .bind(&entry.title)
    .bind(&entry.content)
    .bind(&entry.audio_url)
    .bind(entry.audio_duration)
    .bind(&entry.image_url)
    .bind(entry.created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| classify_store_error(e, AppError::SaveFailed))?;

    info!("Saved journal entry {} for user {}", row.id, row.user_id);
    Ok(row)
}

const ENTRY_WITH_PROMPT: &str = r#"
    SELECT e.id, e.prompt_id, e.title, e.content, e.audio_url, e.audio_duration,
           e.image_url, e.created_at,
           p.text AS prompt_text, p.category AS prompt_category
    FROM journal_entries e
    LEFT JOIN prompts p ON p.id = e.prompt_id
"#;

/// All entries owned by `user_id`, newest first.
pub async fn list_entries(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<EntryWithPromptRow>, AppError> {
    let sql = format!("{ENTRY_WITH_PROMPT} WHERE e.user_id = $1 ORDER BY e.created_at DESC");
    sqlx::query_as::<_, EntryWithPromptRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| classify_store_error(e, load_failed))
}

/// One entry, only if `user_id` owns it.
pub async fn get_entry(
    pool: &PgPool,
    user_id: Uuid,
    entry_id: Uuid,
) -> Result<Option<EntryWithPromptRow>, AppError> {
    let sql = format!("{ENTRY_WITH_PROMPT} WHERE e.user_id = $1 AND e.id = $2");
    sqlx::query_as::<_, EntryWithPromptRow>(&sql)
        .bind(user_id)
        .bind(entry_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| classify_store_error(e, load_failed))
}

fn load_failed(message: String) -> AppError {
    AppError::Internal(anyhow::anyhow!("Unable to load journal entries: {message}"))
}

/// Builds the list-view row. Prompts missing from the join are looked up in the
/// local fallback set, since entries written against it carry `fallback-N` ids.
pub fn summarize(row: EntryWithPromptRow) -> EntrySummary {
    let prompt = match (row.prompt_text, row.prompt_category) {
        (Some(text), Some(category)) => Some(PromptRef { text, category }),
        _ => row
            .prompt_id
            .as_deref()
            .and_then(fallback_prompt)
            .map(|p| PromptRef {
                text: p.text,
                category: p.category,
            }),
    };

    let preview = entry_preview(
        row.content.as_deref(),
        row.audio_url.as_deref(),
        row.image_url.as_deref(),
    );
    let duration_label = row
        .audio_url
        .as_ref()
        .map(|_| format_duration(f64::from(row.audio_duration.unwrap_or(0))));

    EntrySummary {
        id: row.id,
        title: row.title,
        display_date: format_date(&row.created_at),
        display_time: format_time(&row.created_at),
        content: row.content,
        audio_url: row.audio_url,
        audio_duration: row.audio_duration,
        image_url: row.image_url,
        created_at: row.created_at,
        prompt,
        preview,
        duration_label,
    }
}
