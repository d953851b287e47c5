use bytes::Bytes;
use rand::{distributions::Alphanumeric, Rng};
use tracing::info;

use crate::errors::AppError;
use crate::models::upload::{AudioUploadResponse, ImageUploadResponse};
use crate::storage::BlobStore;

const AUDIO_PREFIX: &str = "audio";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const SUFFIX_LEN: usize = 12;

/// An audio file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Validates and stores an audio recording under `audio/<filename>`.
pub async fn upload_audio(
    store: &dyn BlobStore,
    file: AudioFile,
) -> Result<AudioUploadResponse, AppError> {
    if !file.content_type.starts_with("audio/") {
        return Err(AppError::InvalidInput(
            "File must be an audio file".to_string(),
        ));
    }
    if file.data.is_empty() {
        return Err(AppError::InvalidInput(
            "No audio file provided".to_string(),
        ));
    }
    let filename = sanitize_filename(&file.filename)
        .ok_or_else(|| AppError::InvalidInput("Audio filename is invalid".to_string()))?;

    let key = format!("{AUDIO_PREFIX}/{filename}");
    let size = file.data.len();
    let url = store.put(&key, file.data, &file.content_type).await?;
    info!("Stored audio upload {key} ({size} bytes)");

    Ok(AudioUploadResponse {
        url,
        filename,
        size,
        content_type: file.content_type,
    })
}

/// Validates and stores an image. The stored name carries a random suffix so two
/// uploads with the same filename never overwrite each other.
pub async fn upload_image(
    store: &dyn BlobStore,
    payload: Bytes,
    filename: &str,
    content_type: Option<&str>,
) -> Result<ImageUploadResponse, AppError> {
    let filename = sanitize_filename(filename)
        .ok_or_else(|| AppError::InvalidInput("Filename is required".to_string()))?;
    if payload.is_empty() {
        return Err(AppError::InvalidInput("Empty file provided".to_string()));
    }

    let content_type = content_type
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let key = with_random_suffix(&filename);
    let url = store.put(&key, payload, content_type).await?;
    info!("Stored image upload {key}");

    Ok(ImageUploadResponse { url })
}

/// Keeps the final path component only. `None` when nothing usable is left.
fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// `photo.jpg` -> `photo-<suffix>.jpg`
fn with_random_suffix(filename: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{suffix}.{ext}"),
        _ => format!("{filename}-{suffix}"),
    }
}
