use bytes::Bytes;
use tracing::{info, warn};

use crate::client::api::UploadApi;
use crate::client::error::ClientError;
use crate::client::pending::Pending;

pub use crate::models::upload::MAX_IMAGE_BYTES;

/// A file picked by the user.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

pub fn validate_image(file: &SelectedFile) -> Result<(), ClientError> {
    if !file.media_type.starts_with("image/") {
        return Err(ClientError::InvalidType);
    }
    if file.size() >= MAX_IMAGE_BYTES {
        return Err(ClientError::TooLarge {
            size: file.size(),
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// Tracks the photo attached to a draft.
pub struct ImageAttachment<U> {
    uploader: U,
    url: Option<String>,
    uploading: bool,
    last_error: Option<ClientError>,
}

impl<U: UploadApi> ImageAttachment<U> {
    pub fn new(uploader: U) -> Self {
        Self {
            uploader,
            url: None,
            uploading: false,
            last_error: None,
        }
    }

    pub fn with_existing(uploader: U, url: String) -> Self {
        Self {
            url: Some(url),
            ..Self::new(uploader)
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    /// Validates and uploads `file`. Any failure leaves the current attachment as it was.
    pub async fn select_file(&mut self, file: SelectedFile) -> Result<String, ClientError> {
        if let Err(e) = validate_image(&file) {
            warn!("Rejected image '{}': {e}", file.name);
            self.last_error = Some(e.clone());
            return Err(e);
        }

        self.last_error = None;
        let uploading = Pending::enter(&mut self.uploading, true, false);
        let result = self
            .uploader
            .upload_image(file.data, &file.name, &file.media_type)
            .await;
        drop(uploading);

        match result {
            Ok(response) => {
                info!("Attached image {}", response.url);
                self.url = Some(response.url.clone());
                Ok(response.url)
            }
            Err(e) => {
                warn!("Image upload failed: {e}");
                let err = match e {
                    ClientError::UploadFailed(_) => e,
                    other => ClientError::UploadFailed(other.to_string()),
                };
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Detaches the image. Returns the URL that was attached, if any.
    pub fn remove(&mut self) -> Option<String> {
        self.last_error = None;
        self.url.take()
    }
}
