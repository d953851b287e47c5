//! Session readiness and the pending-draft hand-off.
//!
//! A visitor writes a trial entry before signing in. The draft is parked on the server,
//! its token rides through the sign-in redirect as `?pending_draft=<token>`, and once the
//! identity provider reports a session the draft is claimed as a real entry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::api::DraftApi;
use crate::client::error::ClientError;
use crate::models::draft::{PendingDraftRequest, PendingDraftResponse};
use crate::models::entry::JournalEntryRow;

pub const PENDING_DRAFT_PARAM: &str = "pending_draft";
pub const SESSION_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the current access token comes from.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// `None` while signed out or while the session is still being established.
    async fn access_token(&self) -> Option<String>;
}

/// A session whose token never changes.
#[derive(Debug, Clone, Default)]
pub struct FixedSession {
    token: Option<String>,
}

impl FixedSession {
    pub fn signed_in(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionSource for FixedSession {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Extracts the draft token from a redirect target. Accepts absolute URLs and bare
/// paths such as `/journal?pending_draft=...`.
pub fn pending_draft_token(redirect: &str) -> Option<Uuid> {
    let url = Url::parse(redirect)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(redirect)))
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == PENDING_DRAFT_PARAM)
        .and_then(|(_, value)| Uuid::parse_str(&value).ok())
}

/// Polls `source` every `poll` until it yields a token, giving up after `timeout`.
pub async fn wait_for_session<S: SessionSource + ?Sized>(
    source: &S,
    poll: Duration,
    timeout: Duration,
) -> Result<String, ClientError> {
    let wait = async {
        loop {
            if let Some(token) = source.access_token().await {
                return token;
            }
            tokio::time::sleep(poll).await;
        }
    };
    tokio::time::timeout(timeout, wait).await.map_err(|_| {
        warn!("No session after {}ms", timeout.as_millis());
        ClientError::NotAuthenticated
    })
}

/// Parks a trial draft and returns where to send the visitor to sign in.
pub async fn park_trial_draft<D: DraftApi + ?Sized>(
    api: &D,
    prompt_text: Option<String>,
    title: Option<String>,
    content: &str,
) -> Result<PendingDraftResponse, ClientError> {
    if content.trim().is_empty() {
        return Err(ClientError::EmptyEntry);
    }
    let request = PendingDraftRequest {
        prompt_text,
        title: title.filter(|t| !t.trim().is_empty()),
        content: Some(content.to_string()),
    };
    let parked = api.park_draft(&request).await?;
    debug!("Parked trial draft {}", parked.token);
    Ok(parked)
}

/// Claims the draft named in `redirect` once a session exists. `Ok(None)` when the
/// redirect carries no draft.
pub async fn claim_pending_draft<D, S>(
    api: &D,
    session: &S,
    redirect: &str,
    poll: Duration,
    timeout: Duration,
) -> Result<Option<JournalEntryRow>, ClientError>
where
    D: DraftApi + ?Sized,
    S: SessionSource + ?Sized,
{
    let Some(draft_token) = pending_draft_token(redirect) else {
        return Ok(None);
    };
    let access_token = wait_for_session(session, poll, timeout).await?;
    let entry = api.claim_draft(&access_token, draft_token).await?;
    info!("Claimed pending draft {draft_token} as entry {}", entry.id);
    Ok(Some(entry))
}
