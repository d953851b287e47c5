use tracing::{debug, warn};

use crate::client::api::PromptApi;
use crate::models::prompt::Prompt;
use crate::prompts::fallback::random_fallback_prompt;

/// Hands out one prompt per call. The first failed remote fetch switches the picker to
/// the local list for the rest of its lifetime; an empty remote answer only borrows one
/// local prompt.
pub struct PromptPicker<P> {
    source: P,
    offline: bool,
}

impl<P: PromptApi> PromptPicker<P> {
    pub fn new(source: P) -> Self {
        Self {
            source,
            offline: false,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub async fn next_prompt(&mut self) -> Prompt {
        if self.offline {
            return random_fallback_prompt();
        }
        match self.source.random_prompt().await {
            Ok(Some(prompt)) => prompt,
            Ok(None) => {
                debug!("Prompt source is empty, using a local prompt");
                random_fallback_prompt()
            }
            Err(e) => {
                warn!("Prompt source unavailable, switching to local prompts: {e}");
                self.offline = true;
                random_fallback_prompt()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::ClientError;
    use crate::client::testing::MockApi;
    use crate::prompts::fallback::fallback_prompt;

    fn remote() -> Prompt {
        Prompt {
            id: "7f1c".to_string(),
            text: "What are you grateful for?".to_string(),
            category: "gratitude".to_string(),
        }
    }

    #[tokio::test]
    async fn test_remote_prompt_used_when_available() {
        let api = MockApi::default();
        api.queue_prompts(vec![Ok(Some(remote()))]);
        let mut picker = PromptPicker::new(api.clone());

        assert_eq!(picker.next_prompt().await, remote());
        assert!(!picker.is_offline());
    }

    #[tokio::test]
    async fn test_empty_answer_does_not_switch() {
        let api = MockApi::default();
        api.queue_prompts(vec![Ok(None), Ok(Some(remote()))]);
        let mut picker = PromptPicker::new(api.clone());

        let local = picker.next_prompt().await;
        assert!(fallback_prompt(&local.id).is_some());
        assert!(!picker.is_offline());
        assert_eq!(picker.next_prompt().await, remote());
        assert_eq!(api.prompt_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_sticks_to_fallback() {
        let api = MockApi::default();
        api.queue_prompts(vec![
            Err(ClientError::StorageUnavailable("relation does not exist".into())),
            Ok(Some(remote())),
        ]);
        let mut picker = PromptPicker::new(api.clone());

        let first = picker.next_prompt().await;
        assert!(first.id.starts_with("fallback-"));
        assert!(picker.is_offline());

        let second = picker.next_prompt().await;
        assert!(fallback_prompt(&second.id).is_some());
        assert_eq!(api.prompt_calls(), 1);
    }
}
