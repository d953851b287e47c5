use serde::{Deserialize, Serialize};

/// Images at or above this size are refused before upload.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Response of `POST /upload-audio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioUploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// Response of `POST /upload-image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub url: String,
}
