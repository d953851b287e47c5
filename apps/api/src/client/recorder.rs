//! Recording state machine.
//!
//! ```text
//! Idle --start--> Recording --stop--> Recorded --upload--> Uploading --ok--> Attached
//!                                        ^  |                  |
//!                                        |  +--delete--> Idle  +--err--> Recorded
//! ```
//!
//! Playback (`Paused`/`Playing`) is a sub-state of `Recorded`/`Attached` and never moves
//! the outer machine. The input device is held by a [`DeviceGuard`] so it is released
//! exactly once whichever way `Recording` is left, including teardown.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::client::api::UploadApi;
use crate::client::error::ClientError;
use crate::client::pending::Pending;
use crate::format::format_duration;

/// Container type of every finished recording.
pub const RECORDING_MIME: &str = "audio/webm";
const RECORDING_EXTENSION: &str = "webm";
const TICK: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Recorded,
    Uploading,
    Attached,
}

impl RecorderState {
    pub fn name(&self) -> &'static str {
        match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
            RecorderState::Recorded => "recorded",
            RecorderState::Uploading => "uploading",
            RecorderState::Attached => "attached",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Playback {
    #[default]
    Paused,
    Playing,
}

/// What the UI should feed its audio element.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSource {
    Memory { data: Bytes, mime: &'static str },
    Remote { url: String },
}

/// One encoded slice of audio as delivered by the input device.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub captured_at: DateTime<Utc>,
    pub data: Bytes,
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("device unavailable: {0}")]
    Unavailable(String),
}

/// Live handle on an opened input device.
pub trait DeviceHandle: Send {
    /// Stops capture and gives the device back. Called exactly once.
    fn release(&mut self);
}

/// An opened device: the chunk stream plus the handle that owns the device.
pub struct CaptureSession {
    pub chunks: mpsc::Receiver<AudioChunk>,
    pub handle: Box<dyn DeviceHandle>,
}

/// Microphone access.
#[async_trait]
pub trait AudioInput: Send + Sync {
    /// Requests exclusive access to the input. Denial is `DeviceError::PermissionDenied`.
    async fn open(&self) -> Result<CaptureSession, DeviceError>;
}

/// Scoped ownership of the device handle; releases on `release()` or on drop,
/// whichever comes first, and never twice.
pub struct DeviceGuard {
    handle: Option<Box<dyn DeviceHandle>>,
}

impl DeviceGuard {
    pub fn new(handle: Box<dyn DeviceHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
            debug!("Audio input released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Reference left in the draft once a recording is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAttachment {
    pub url: String,
    pub duration_secs: u32,
}

/// Duration to report with an upload: the finalized duration when it is usable,
/// otherwise the live elapsed counter.
pub fn resolve_duration(finalized: f64, elapsed_secs: u64) -> u32 {
    if finalized.is_finite() && finalized > 0.0 {
        finalized.floor() as u32
    } else {
        u32::try_from(elapsed_secs).unwrap_or(u32::MAX)
    }
}

/// `audio-<unix millis>.webm`
pub fn recording_filename(at: DateTime<Utc>) -> String {
    format!("audio-{}.{RECORDING_EXTENSION}", at.timestamp_millis())
}

pub struct AudioRecorder<I, U> {
    input: I,
    uploader: U,
    state: RecorderState,
    playback: Playback,
    elapsed: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
    collector: Option<JoinHandle<Vec<AudioChunk>>>,
    stop_capture: Option<oneshot::Sender<()>>,
    device: Option<DeviceGuard>,
    recording: Option<Bytes>,
    duration: f64,
    external_duration: Option<u32>,
    attachment: Option<AudioAttachment>,
    last_error: Option<ClientError>,
}

impl<I: AudioInput, U: UploadApi> AudioRecorder<I, U> {
    pub fn new(input: I, uploader: U) -> Self {
        Self {
            input,
            uploader,
            state: RecorderState::Idle,
            playback: Playback::Paused,
            elapsed: Arc::new(AtomicU64::new(0)),
            ticker: None,
            collector: None,
            stop_capture: None,
            device: None,
            recording: None,
            duration: 0.0,
            external_duration: None,
            attachment: None,
            last_error: None,
        }
    }

    /// Resumes with audio that was uploaded earlier. A supplied duration wins over
    /// anything decoded from metadata later.
    pub fn with_attached(input: I, uploader: U, url: String, duration_secs: Option<u32>) -> Self {
        let mut recorder = Self::new(input, uploader);
        let external = duration_secs.filter(|d| *d > 0);
        recorder.external_duration = external;
        recorder.duration = f64::from(external.unwrap_or(0));
        recorder.attachment = Some(AudioAttachment {
            url,
            duration_secs: external.unwrap_or(0),
        });
        recorder.state = RecorderState::Attached;
        recorder
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn attachment(&self) -> Option<&AudioAttachment> {
        self.attachment.as_ref()
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    pub fn has_device(&self) -> bool {
        self.device.as_ref().is_some_and(DeviceGuard::is_held)
    }

    /// `M:SS` label: the live counter while recording, the duration afterwards.
    pub fn time_label(&self) -> String {
        match self.state {
            RecorderState::Recording => format_duration(self.elapsed_secs() as f64),
            _ if self.duration > 0.0 => format_duration(self.duration),
            _ => format_duration(self.elapsed_secs() as f64),
        }
    }

    fn invalid(&self, action: &'static str) -> ClientError {
        ClientError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.last_error = Some(err.clone());
        err
    }

    pub async fn start_recording(&mut self) -> Result<(), ClientError> {
        if self.state != RecorderState::Idle {
            return Err(self.invalid("start recording"));
        }
        self.last_error = None;

        let session = match self.input.open().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not open audio input: {e}");
                self.state = RecorderState::Idle;
                return Err(self.fail(ClientError::PermissionDenied(e.to_string())));
            }
        };

        self.device = Some(DeviceGuard::new(session.handle));
        self.elapsed.store(0, Ordering::Relaxed);
        self.duration = 0.0;
        self.recording = None;
        self.playback = Playback::Paused;

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_capture = Some(stop_tx);
        self.collector = Some(tokio::spawn(collect_chunks(session.chunks, stop_rx)));
        self.ticker = Some(tokio::spawn(tick_elapsed(self.elapsed.clone())));
        self.state = RecorderState::Recording;

        info!("Recording started");
        Ok(())
    }

    pub async fn stop_recording(&mut self) -> Result<(), ClientError> {
        if self.state != RecorderState::Recording {
            return Err(self.invalid("stop recording"));
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(mut device) = self.device.take() {
            device.release();
        }
        if let Some(stop) = self.stop_capture.take() {
            let _ = stop.send(());
        }

        let chunks = match self.collector.take() {
            Some(collector) => collector.await.unwrap_or_else(|e| {
                warn!("Chunk collector ended abnormally: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };

        if let (Some(first), Some(last)) = (chunks.first(), chunks.last()) {
            debug!(
                "Collected {} chunks spanning {}ms",
                chunks.len(),
                (last.captured_at - first.captured_at).num_milliseconds()
            );
        }

        let data = concat_chunks(&chunks);
        let elapsed = self.elapsed_secs();
        info!("Recording stopped: {} bytes, {elapsed}s", data.len());

        self.recording = Some(data);
        self.duration = elapsed as f64;
        self.state = RecorderState::Recorded;
        Ok(())
    }

    /// Media metadata became available. Ignored when a duration was supplied with
    /// the attached audio; otherwise a decoded duration that is not finite and positive
    /// falls back to the elapsed counter.
    pub fn metadata_loaded(&mut self, decoded_secs: f64) -> u32 {
        if let Some(external) = self.external_duration {
            return external;
        }
        self.duration = if decoded_secs.is_finite() && decoded_secs > 0.0 {
            decoded_secs.floor()
        } else {
            self.elapsed_secs() as f64
        };
        let resolved = resolve_duration(self.duration, self.elapsed_secs());
        if let Some(attachment) = self.attachment.as_mut() {
            attachment.duration_secs = resolved;
        }
        resolved
    }

    pub fn playback_source(&self) -> Option<PlaybackSource> {
        match (&self.recording, &self.attachment) {
            (Some(data), _) => Some(PlaybackSource::Memory {
                data: data.clone(),
                mime: RECORDING_MIME,
            }),
            (None, Some(attachment)) => Some(PlaybackSource::Remote {
                url: attachment.url.clone(),
            }),
            (None, None) => None,
        }
    }

    /// Starts playback if there is audio to play. Returns whether it started.
    pub fn play(&mut self) -> bool {
        if self.playback_source().is_none() {
            return false;
        }
        self.playback = Playback::Playing;
        true
    }

    pub fn pause(&mut self) {
        self.playback = Playback::Paused;
    }

    /// The audio element reached its end.
    pub fn playback_ended(&mut self) {
        self.playback = Playback::Paused;
    }

    /// Discards the recording (or the attached reference). No-op from `Idle`.
    pub fn delete_recording(&mut self) -> Result<(), ClientError> {
        match self.state {
            RecorderState::Idle => Ok(()),
            RecorderState::Recorded | RecorderState::Attached => {
                self.recording = None;
                self.attachment = None;
                self.duration = 0.0;
                self.external_duration = None;
                self.elapsed.store(0, Ordering::Relaxed);
                self.playback = Playback::Paused;
                self.last_error = None;
                self.state = RecorderState::Idle;
                debug!("Recording deleted");
                Ok(())
            }
            RecorderState::Recording | RecorderState::Uploading => {
                Err(self.invalid("delete the recording"))
            }
        }
    }

    /// Uploads the finished recording. On success the in-memory audio is dropped and
    /// only the returned reference is kept.
    pub async fn upload(&mut self) -> Result<AudioAttachment, ClientError> {
        if self.state != RecorderState::Recorded {
            return Err(self.invalid("upload"));
        }
        let Some(data) = self.recording.clone().filter(|d| !d.is_empty()) else {
            return Err(self.fail(ClientError::InvalidInput(
                "Nothing was recorded".to_string(),
            )));
        };

        self.last_error = None;
        let duration_secs = resolve_duration(self.duration, self.elapsed_secs());
        let filename = recording_filename(Utc::now());

        // an abandoned upload falls back to Recorded so it can be retried or deleted
        let uploading = Pending::enter(
            &mut self.state,
            RecorderState::Uploading,
            RecorderState::Recorded,
        );
        let result = self
            .uploader
            .upload_audio(data, &filename, RECORDING_MIME)
            .await;

        match result {
            Ok(response) => {
                uploading.settle(RecorderState::Attached);
                let attachment = AudioAttachment {
                    url: response.url,
                    duration_secs,
                };
                info!(
                    "Uploaded {filename} ({}s) to {}",
                    attachment.duration_secs, attachment.url
                );
                self.recording = None;
                self.attachment = Some(attachment.clone());
                Ok(attachment)
            }
            Err(e) => {
                drop(uploading);
                warn!("Audio upload failed: {e}");
                let err = match e {
                    ClientError::UploadFailed(_) => e,
                    other => ClientError::UploadFailed(other.to_string()),
                };
                Err(self.fail(err))
            }
        }
    }
}

impl<I, U> Drop for AudioRecorder<I, U> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(mut device) = self.device.take() {
            device.release();
        }
    }
}

async fn tick_elapsed(elapsed: Arc<AtomicU64>) {
    let mut interval = interval_at(Instant::now() + TICK, TICK);
    loop {
        interval.tick().await;
        elapsed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Gathers non-empty chunks until the device closes the stream or capture is
/// stopped, then drains whatever is still buffered.
async fn collect_chunks(
    mut chunks: mpsc::Receiver<AudioChunk>,
    mut stop: oneshot::Receiver<()>,
) -> Vec<AudioChunk> {
    let mut collected = Vec::new();
    loop {
        tokio::select! {
            chunk = chunks.recv() => match chunk {
                Some(chunk) => push_chunk(&mut collected, chunk),
                None => return collected,
            },
            _ = &mut stop => break,
        }
    }
    chunks.close();
    while let Some(chunk) = chunks.recv().await {
        push_chunk(&mut collected, chunk);
    }
    collected
}

fn push_chunk(collected: &mut Vec<AudioChunk>, chunk: AudioChunk) {
    if !chunk.data.is_empty() {
        collected.push(chunk);
    }
}

fn concat_chunks(chunks: &[AudioChunk]) -> Bytes {
    let total = chunks.iter().map(|c| c.data.len()).sum();
    let mut buf = BytesMut::with_capacity(total);
    for chunk in chunks {
        buf.extend_from_slice(&chunk.data);
    }
    buf.freeze()
}
