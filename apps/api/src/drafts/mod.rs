//! Pending-draft hand-off: a trial draft written before sign-in is parked under an
//! opaque token that rides through the login redirect, then claimed once by the
//! signed-in user.

pub mod handlers;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::draft::PendingDraft;

const KEY_PREFIX: &str = "pending_draft";

/// Token-keyed draft storage. `take` must be atomic: a draft is claimed at most once.
#[async_trait]
pub trait PendingDraftStore: Send + Sync {
    async fn put(&self, token: Uuid, draft: &PendingDraft) -> Result<(), AppError>;
    async fn take(&self, token: Uuid) -> Result<Option<PendingDraft>, AppError>;
}

/// Redis-backed store; drafts expire after `ttl_secs`.
pub struct RedisDraftStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisDraftStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

fn draft_key(token: Uuid) -> String {
    format!("{KEY_PREFIX}:{token}")
}

#[async_trait]
impl PendingDraftStore for RedisDraftStore {
    async fn put(&self, token: Uuid, draft: &PendingDraft) -> Result<(), AppError> {
        let payload = serde_json::to_string(draft)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode draft: {e}")))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(draft_key(token), payload, self.ttl_secs)
            .await?;
        info!("Parked pending draft {token} for {}s", self.ttl_secs);
        Ok(())
    }

    async fn take(&self, token: Uuid) -> Result<Option<PendingDraft>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = redis::cmd("GETDEL")
            .arg(draft_key(token))
            .query_async(&mut conn)
            .await?;

        payload
            .map(|p| {
                serde_json::from_str::<PendingDraft>(&p).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Corrupt pending draft {token}: {e}"))
                })
            })
            .transpose()
    }
}
