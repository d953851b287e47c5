use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A writing cue. Ids are text so local fallback prompts (`fallback-N`) share the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Prompt {
    pub id: String,
    pub text: String,
    pub category: String,
}
