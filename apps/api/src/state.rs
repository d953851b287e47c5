use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::drafts::PendingDraftStore;
use crate::storage::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Object storage behind the upload gateway. Default: S3BlobStore.
    pub blobs: Arc<dyn BlobStore>,
    /// Short-lived trial drafts waiting for sign-in. Default: RedisDraftStore.
    pub drafts: Arc<dyn PendingDraftStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Config,
}
