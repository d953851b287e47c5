use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::client::api::{DraftApi, EntryApi, PromptApi, UploadApi};
use crate::client::error::ClientError;
use crate::client::recorder::{
    AudioChunk, AudioInput, CaptureSession, DeviceError, DeviceHandle,
};
use crate::models::draft::{PendingDraftRequest, PendingDraftResponse};
use crate::models::entry::{EntrySummary, JournalEntryRow, NewEntryRequest};
use crate::models::prompt::Prompt;
use crate::models::upload::{AudioUploadResponse, ImageUploadResponse};

#[derive(Debug, Clone)]
pub struct UploadCall {
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
}

#[derive(Default)]
struct Calls {
    audio_uploads: Vec<UploadCall>,
    image_uploads: Vec<UploadCall>,
    fail_uploads: bool,
    stall_uploads: bool,
    created: Vec<(String, NewEntryRequest)>,
    save_error: Option<ClientError>,
    prompt_responses: VecDeque<Result<Option<Prompt>, ClientError>>,
    prompt_calls: usize,
    parked: Vec<PendingDraftRequest>,
    claims: Vec<(String, Uuid)>,
}

/// In-memory server double. Clones share the same call log.
#[derive(Clone, Default)]
pub struct MockApi {
    calls: Arc<Mutex<Calls>>,
}

impl MockApi {
    pub fn fail_uploads(&self, fail: bool) {
        self.calls.lock().unwrap().fail_uploads = fail;
    }

    /// Uploads never answer while set, like a request the caller gives up on.
    pub fn stall_uploads(&self, stall: bool) {
        self.calls.lock().unwrap().stall_uploads = stall;
    }

    pub fn fail_saves(&self, error: Option<ClientError>) {
        self.calls.lock().unwrap().save_error = error;
    }

    /// Queues answers for `random_prompt`; once drained it answers `Ok(None)`.
    pub fn queue_prompts(&self, responses: Vec<Result<Option<Prompt>, ClientError>>) {
        self.calls.lock().unwrap().prompt_responses.extend(responses);
    }

    pub fn audio_uploads(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().audio_uploads.clone()
    }

    pub fn image_uploads(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().image_uploads.clone()
    }

    pub fn created(&self) -> Vec<(String, NewEntryRequest)> {
        self.calls.lock().unwrap().created.clone()
    }

    pub fn prompt_calls(&self) -> usize {
        self.calls.lock().unwrap().prompt_calls
    }

    pub fn parked(&self) -> Vec<PendingDraftRequest> {
        self.calls.lock().unwrap().parked.clone()
    }

    pub fn claims(&self) -> Vec<(String, Uuid)> {
        self.calls.lock().unwrap().claims.clone()
    }

    async fn wait_unless_stalled(&self) {
        let stalled = self.calls.lock().unwrap().stall_uploads;
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    fn record_upload(
        &self,
        image: bool,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<usize, ClientError> {
        let mut calls = self.calls.lock().unwrap();
        if calls.fail_uploads {
            return Err(ClientError::UploadFailed(
                "storage rejected the object".to_string(),
            ));
        }
        let call = UploadCall {
            data,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        };
        let log = if image {
            &mut calls.image_uploads
        } else {
            &mut calls.audio_uploads
        };
        log.push(call);
        Ok(log.len())
    }
}

fn row_from(request: &NewEntryRequest) -> JournalEntryRow {
    JournalEntryRow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        prompt_id: request.prompt_id.clone(),
        title: request.title.clone(),
        content: request.content.clone(),
        audio_url: request.audio_url.clone(),
        audio_duration: request.audio_duration.map(|d| d as i32),
        image_url: request.image_url.clone(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl UploadApi for MockApi {
    async fn upload_audio(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<AudioUploadResponse, ClientError> {
        self.wait_unless_stalled().await;
        let size = data.len();
        let n = self.record_upload(false, data, filename, content_type)?;
        Ok(AudioUploadResponse {
            url: format!("https://blobs.test/audio/{n}"),
            filename: filename.to_string(),
            size,
            content_type: content_type.to_string(),
        })
    }

    async fn upload_image(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<ImageUploadResponse, ClientError> {
        self.wait_unless_stalled().await;
        let n = self.record_upload(true, data, filename, content_type)?;
        Ok(ImageUploadResponse {
            url: format!("https://blobs.test/images/{n}"),
        })
    }
}

#[async_trait]
impl EntryApi for MockApi {
    async fn create_entry(
        &self,
        access_token: &str,
        entry: &NewEntryRequest,
    ) -> Result<JournalEntryRow, ClientError> {
        let mut calls = self.calls.lock().unwrap();
        calls.created.push((access_token.to_string(), entry.clone()));
        match &calls.save_error {
            Some(e) => Err(e.clone()),
            None => Ok(row_from(entry)),
        }
    }

    async fn list_entries(&self, _access_token: &str) -> Result<Vec<EntrySummary>, ClientError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl PromptApi for MockApi {
    async fn random_prompt(&self) -> Result<Option<Prompt>, ClientError> {
        let mut calls = self.calls.lock().unwrap();
        calls.prompt_calls += 1;
        calls.prompt_responses.pop_front().unwrap_or(Ok(None))
    }
}

#[async_trait]
impl DraftApi for MockApi {
    async fn park_draft(
        &self,
        draft: &PendingDraftRequest,
    ) -> Result<PendingDraftResponse, ClientError> {
        self.calls.lock().unwrap().parked.push(draft.clone());
        let token = Uuid::new_v4();
        Ok(PendingDraftResponse {
            token,
            redirect_path: format!("/login?pending_draft={token}"),
        })
    }

    async fn claim_draft(
        &self,
        access_token: &str,
        draft_token: Uuid,
    ) -> Result<JournalEntryRow, ClientError> {
        let mut calls = self.calls.lock().unwrap();
        calls.claims.push((access_token.to_string(), draft_token));
        if let Some(e) = &calls.save_error {
            return Err(e.clone());
        }
        let parked = calls.parked.last().cloned().unwrap_or_default();
        Ok(row_from(&NewEntryRequest {
            title: parked.title,
            content: parked.content,
            ..Default::default()
        }))
    }
}

/// Audio input that replays fixed chunks and counts device opens and releases.
#[derive(Clone, Default)]
pub struct MockInput {
    chunks: Vec<&'static str>,
    deny: bool,
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl MockInput {
    pub fn with_chunks(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            ..Default::default()
        }
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Default::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Dropping the sender on release ends the chunk stream, like a stopped device.
pub struct MockHandle {
    sender: Option<mpsc::Sender<AudioChunk>>,
    releases: Arc<AtomicUsize>,
}

impl MockHandle {
    pub fn new(sender: mpsc::Sender<AudioChunk>, releases: Arc<AtomicUsize>) -> Self {
        Self {
            sender: Some(sender),
            releases,
        }
    }
}

impl DeviceHandle for MockHandle {
    fn release(&mut self) {
        self.sender.take();
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioInput for MockInput {
    async fn open(&self) -> Result<CaptureSession, DeviceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            return Err(DeviceError::PermissionDenied);
        }
        let (tx, rx) = mpsc::channel(16);
        for data in self.chunks.iter().copied() {
            tx.try_send(AudioChunk {
                captured_at: Utc::now(),
                data: Bytes::from_static(data.as_bytes()),
            })
            .unwrap();
        }
        Ok(CaptureSession {
            chunks: rx,
            handle: Box::new(MockHandle::new(tx, self.releases.clone())),
        })
    }
}
