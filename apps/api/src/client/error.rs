use thiserror::Error;

/// Everything a client operation can report. Each variant renders to a message fit
/// for display via [`ClientError::user_message`]; nothing here is retried automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("Audio input unavailable: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Selected file is not an image")]
    InvalidType,

    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Entry has no text, audio or image")]
    EmptyEntry,

    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("Load failed: {0}")]
    LoadFailed(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

impl ClientError {
    pub fn user_message(&self) -> String {
        match self {
            ClientError::PermissionDenied(_) => {
                "Unable to access microphone. Please check your permissions.".to_string()
            }
            ClientError::InvalidInput(msg) => msg.clone(),
            ClientError::InvalidType => "Please select an image file".to_string(),
            ClientError::TooLarge { .. } => "Image must be smaller than 5MB".to_string(),
            ClientError::UploadFailed(_) => "Upload failed. Please try again.".to_string(),
            ClientError::StorageUnavailable(_) => {
                "Database setup required. Please run the setup script from Project Settings."
                    .to_string()
            }
            ClientError::NotAuthenticated => {
                "You must be logged in to save entries.".to_string()
            }
            ClientError::EmptyEntry => {
                "Please write something, record audio, or add a photo before saving.".to_string()
            }
            ClientError::SaveFailed(_) => {
                "There was an error saving your entry. Please try again.".to_string()
            }
            ClientError::LoadFailed(_) => "Unable to load your journal entries.".to_string(),
            ClientError::InvalidTransition { .. } => self.to_string(),
        }
    }
}
