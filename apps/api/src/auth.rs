//! Session verification against the external identity provider.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Resolves a bearer token to a user. `Ok(None)` means the token is not a live session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, access_token: &str) -> Result<Option<SessionUser>, AppError>;
}

/// Identity provider reached over HTTP (`GET <base>/auth/v1/user`).
pub struct RemoteIdentityProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteIdentityProvider {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn resolve(&self, access_token: &str) -> Result<Option<SessionUser>, AppError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Identity provider unreachable: {e}"))
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Identity provider rejected session token");
                Ok(None)
            }
            status if status.is_success() => {
                let user = response.json::<SessionUser>().await.map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Malformed identity response: {e}"))
                })?;
                Ok(Some(user))
            }
            status => {
                warn!("Identity provider returned {status}");
                Err(AppError::Internal(anyhow::anyhow!(
                    "Identity provider returned {status}"
                )))
            }
        }
    }
}

/// Extractor for routes that require a session.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::NotAuthenticated)?;

        state
            .identity
            .resolve(token)
            .await?
            .map(AuthUser)
            .ok_or(AppError::NotAuthenticated)
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
