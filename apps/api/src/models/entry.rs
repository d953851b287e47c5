use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted journal entry as stored in `journal_entries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub audio_url: Option<String>,
    pub audio_duration: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entry row joined with the text and category of its prompt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntryWithPromptRow {
    pub id: Uuid,
    pub prompt_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub audio_url: Option<String>,
    pub audio_duration: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub prompt_text: Option<String>,
    pub prompt_category: Option<String>,
}

/// Body of `POST /api/v1/entries`. Every field is optional; emptiness is checked on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEntryRequest {
    #[serde(default)]
    pub prompt_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub audio_duration: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRef {
    pub text: String,
    pub category: String,
}

/// One row of the entry list, with display strings precomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub audio_url: Option<String>,
    pub audio_duration: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub prompt: Option<PromptRef>,
    pub preview: String,
    pub display_date: String,
    pub display_time: String,
    pub duration_label: Option<String>,
}
