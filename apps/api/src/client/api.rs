//! Transport seams between the client logic and the server, plus the reqwest-backed
//! implementation used outside of tests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client, Response, StatusCode, Url,
};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::models::draft::{PendingDraftRequest, PendingDraftResponse};
use crate::models::entry::{EntrySummary, JournalEntryRow, NewEntryRequest};
use crate::models::prompt::Prompt;
use crate::models::upload::{AudioUploadResponse, ImageUploadResponse};

#[async_trait]
pub trait UploadApi: Send + Sync {
    async fn upload_audio(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<AudioUploadResponse, ClientError>;

    async fn upload_image(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<ImageUploadResponse, ClientError>;
}

#[async_trait]
pub trait EntryApi: Send + Sync {
    async fn create_entry(
        &self,
        access_token: &str,
        entry: &NewEntryRequest,
    ) -> Result<JournalEntryRow, ClientError>;

    async fn list_entries(&self, access_token: &str) -> Result<Vec<EntrySummary>, ClientError>;
}

#[async_trait]
pub trait PromptApi: Send + Sync {
    /// `Ok(None)` when the source answered but had nothing to offer.
    async fn random_prompt(&self) -> Result<Option<Prompt>, ClientError>;
}

#[async_trait]
pub trait DraftApi: Send + Sync {
    async fn park_draft(
        &self,
        draft: &PendingDraftRequest,
    ) -> Result<PendingDraftResponse, ClientError>;

    async fn claim_draft(
        &self,
        access_token: &str,
        draft_token: Uuid,
    ) -> Result<JournalEntryRow, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// The `{"error": {"code", "message"}}` body every failing server route returns.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Maps a failed entry write back onto the client taxonomy.
pub fn entry_error(status: u16, body: Option<&ErrorBody>) -> ClientError {
    let code = body.map(|b| b.code.as_str());
    let message = body
        .map(|b| b.message.clone())
        .unwrap_or_else(|| format!("status {status}"));
    match (status, code) {
        (401, _) | (_, Some("NOT_AUTHENTICATED")) => ClientError::NotAuthenticated,
        (_, Some("STORAGE_UNAVAILABLE")) => ClientError::StorageUnavailable(message),
        (_, Some("EMPTY_ENTRY")) => ClientError::EmptyEntry,
        _ => ClientError::SaveFailed(message),
    }
}

/// HTTP client for the journal API.
#[derive(Clone)]
pub struct HttpJournalClient {
    http: Client,
    base_url: Url,
}

impl HttpJournalClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ClientError::InvalidInput(format!("Invalid API base URL: {e}")))?;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::InvalidInput(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidInput(format!("Invalid endpoint '{path}': {e}")))
    }

    async fn error_body(response: Response) -> Option<ErrorBody> {
        let text = response.text().await.ok()?;
        serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error)
            .ok()
    }

    async fn upload_error(response: Response) -> ClientError {
        let status = response.status();
        let message = Self::error_body(response)
            .await
            .map(|b| b.message)
            .unwrap_or_else(|| status.to_string());
        warn!("Upload rejected with {status}: {message}");
        ClientError::UploadFailed(message)
    }
}

#[async_trait]
impl UploadApi for HttpJournalClient {
    async fn upload_audio(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<AudioUploadResponse, ClientError> {
        let part = Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| ClientError::InvalidInput(format!("Invalid audio type: {e}")))?;
        let response = self
            .http
            .post(self.endpoint("upload-audio")?)
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(|e| ClientError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::upload_error(response).await);
        }
        response
            .json::<AudioUploadResponse>()
            .await
            .map_err(|e| ClientError::UploadFailed(format!("Malformed upload response: {e}")))
    }

    async fn upload_image(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<ImageUploadResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint("upload-image")?)
            .query(&[("filename", filename)])
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| ClientError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::upload_error(response).await);
        }
        response
            .json::<ImageUploadResponse>()
            .await
            .map_err(|e| ClientError::UploadFailed(format!("Malformed upload response: {e}")))
    }
}

#[async_trait]
impl EntryApi for HttpJournalClient {
    async fn create_entry(
        &self,
        access_token: &str,
        entry: &NewEntryRequest,
    ) -> Result<JournalEntryRow, ClientError> {
        let response = self
            .http
            .post(self.endpoint("api/v1/entries")?)
            .bearer_auth(access_token)
            .json(entry)
            .send()
            .await
            .map_err(|e| ClientError::SaveFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(entry_error(status.as_u16(), body.as_ref()));
        }
        response
            .json::<JournalEntryRow>()
            .await
            .map_err(|e| ClientError::SaveFailed(format!("Malformed entry response: {e}")))
    }

    async fn list_entries(&self, access_token: &str) -> Result<Vec<EntrySummary>, ClientError> {
        let response = self
            .http
            .get(self.endpoint("api/v1/entries")?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ClientError::LoadFailed(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ClientError::NotAuthenticated),
            status if status.is_success() => response
                .json::<Vec<EntrySummary>>()
                .await
                .map_err(|e| ClientError::LoadFailed(e.to_string())),
            status => Err(ClientError::LoadFailed(format!("status {status}"))),
        }
    }
}

#[async_trait]
impl PromptApi for HttpJournalClient {
    async fn random_prompt(&self) -> Result<Option<Prompt>, ClientError> {
        let response = self
            .http
            .get(self.endpoint("api/v1/prompts/random")?)
            .send()
            .await
            .map_err(|e| ClientError::StorageUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("Prompt source has no prompts");
                Ok(None)
            }
            status if status.is_success() => response
                .json::<Prompt>()
                .await
                .map(Some)
                .map_err(|e| ClientError::StorageUnavailable(e.to_string())),
            status => Err(ClientError::StorageUnavailable(format!("status {status}"))),
        }
    }
}

#[async_trait]
impl DraftApi for HttpJournalClient {
    async fn park_draft(
        &self,
        draft: &PendingDraftRequest,
    ) -> Result<PendingDraftResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint("api/v1/drafts")?)
            .json(draft)
            .send()
            .await
            .map_err(|e| ClientError::SaveFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(entry_error(status.as_u16(), body.as_ref()));
        }
        response
            .json::<PendingDraftResponse>()
            .await
            .map_err(|e| ClientError::SaveFailed(e.to_string()))
    }

    async fn claim_draft(
        &self,
        access_token: &str,
        draft_token: Uuid,
    ) -> Result<JournalEntryRow, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&format!("api/v1/drafts/{draft_token}/claim"))?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ClientError::SaveFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(entry_error(status.as_u16(), body.as_ref()));
        }
        response
            .json::<JournalEntryRow>()
            .await
            .map_err(|e| ClientError::SaveFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: &str) -> ErrorBody {
        ErrorBody {
            code: code.to_string(),
            message: "relation \"journal_entries\" does not exist".to_string(),
        }
    }

    #[test]
    fn test_entry_error_mapping() {
        assert_eq!(entry_error(401, None), ClientError::NotAuthenticated);
        assert!(matches!(
            entry_error(503, Some(&body("STORAGE_UNAVAILABLE"))),
            ClientError::StorageUnavailable(_)
        ));
        assert_eq!(
            entry_error(422, Some(&body("EMPTY_ENTRY"))),
            ClientError::EmptyEntry
        );
        assert!(matches!(
            entry_error(500, Some(&body("SAVE_FAILED"))),
            ClientError::SaveFailed(_)
        ));
        assert!(matches!(entry_error(502, None), ClientError::SaveFailed(_)));
    }

    #[test]
    fn test_endpoint_joins_relative_to_base() {
        let client = HttpJournalClient::new("http://localhost:8080/journal").unwrap();
        assert_eq!(
            client.endpoint("upload-audio").unwrap().as_str(),
            "http://localhost:8080/journal/upload-audio"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpJournalClient::new("not a url"),
            Err(ClientError::InvalidInput(_))
        ));
    }
}
