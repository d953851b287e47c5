//! Entry composition: collects the pieces of a draft and persists them as one entry.

use std::time::Duration;

use tracing::{info, warn};

use crate::client::api::EntryApi;
use crate::client::error::ClientError;
use crate::client::recorder::AudioAttachment;
use crate::client::session::SessionSource;
use crate::entries::repository::MAX_TITLE_CHARS;
use crate::models::entry::{JournalEntryRow, NewEntryRequest};
use crate::models::prompt::Prompt;

/// How long the "saved" confirmation stays up before the draft is cleared.
pub const SAVED_DISPLAY_DELAY: Duration = Duration::from_secs(2);

/// An entry under composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub prompt: Option<Prompt>,
    pub title: String,
    pub content: String,
    pub audio: Option<AudioAttachment>,
    pub image_url: Option<String>,
}

impl Draft {
    /// True when there is nothing worth saving. A title alone does not count.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.audio.is_none() && self.image_url.is_none()
    }

    pub fn to_request(&self) -> NewEntryRequest {
        NewEntryRequest {
            prompt_id: self.prompt.as_ref().map(|p| p.id.clone()),
            title: trimmed(&self.title),
            content: trimmed(&self.content),
            audio_url: self.audio.as_ref().map(|a| a.url.clone()),
            audio_duration: self
                .audio
                .as_ref()
                .map(|a| a.duration_secs)
                .filter(|d| *d > 0),
            image_url: self.image_url.clone(),
        }
    }

    fn clear_keeping_prompt(&mut self) {
        *self = Draft {
            prompt: self.prompt.take(),
            ..Default::default()
        };
    }
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SaveStatus {
    #[default]
    Editing,
    Saving,
    Saved,
    Failed(String),
}

/// Clears a saved draft when dropped, whether the display delay ran out or the
/// save future was abandoned during it.
struct ClearSavedDraft<'a> {
    draft: &'a mut Draft,
    status: &'a mut SaveStatus,
}

impl Drop for ClearSavedDraft<'_> {
    fn drop(&mut self) {
        self.draft.clear_keeping_prompt();
        *self.status = SaveStatus::Editing;
    }
}

pub struct EntryComposer<E, S> {
    entries: E,
    session: S,
    draft: Draft,
    status: SaveStatus,
}

impl<E: EntryApi, S: SessionSource> EntryComposer<E, S> {
    pub fn new(entries: E, session: S, prompt: Option<Prompt>) -> Self {
        Self {
            entries,
            session,
            draft: Draft {
                prompt,
                ..Default::default()
            },
            status: SaveStatus::Editing,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn set_prompt(&mut self, prompt: Prompt) {
        self.draft.prompt = Some(prompt);
    }

    /// Titles longer than the stored limit are cut, counting characters.
    pub fn set_title(&mut self, title: &str) {
        self.draft.title = title.chars().take(MAX_TITLE_CHARS).collect();
    }

    pub fn set_content(&mut self, content: &str) {
        self.draft.content = content.to_string();
    }

    pub fn attach_audio(&mut self, audio: AudioAttachment) {
        self.draft.audio = Some(audio);
    }

    pub fn remove_audio(&mut self) {
        self.draft.audio = None;
    }

    pub fn attach_image(&mut self, url: String) {
        self.draft.image_url = Some(url);
    }

    pub fn remove_image(&mut self) {
        self.draft.image_url = None;
    }

    /// Empties the draft but keeps its prompt.
    pub fn clear(&mut self) {
        self.draft.clear_keeping_prompt();
        self.status = SaveStatus::Editing;
    }

    /// Persists the draft. `on_saved` runs as soon as the entry exists; the draft is
    /// cleared after [`SAVED_DISPLAY_DELAY`], or as soon as the returned future is
    /// dropped. Nothing is sent for an empty draft or without a session.
    pub async fn save<F>(&mut self, on_saved: F) -> Result<JournalEntryRow, ClientError>
    where
        F: FnOnce(&JournalEntryRow),
    {
        match self.persist().await {
            Ok(row) => {
                self.status = SaveStatus::Saved;
                on_saved(&row);
                let _clear = ClearSavedDraft {
                    draft: &mut self.draft,
                    status: &mut self.status,
                };
                tokio::time::sleep(SAVED_DISPLAY_DELAY).await;
                Ok(row)
            }
            Err(e) => {
                self.status = SaveStatus::Failed(e.user_message());
                Err(e)
            }
        }
    }

    async fn persist(&mut self) -> Result<JournalEntryRow, ClientError> {
        if self.draft.is_empty() {
            return Err(ClientError::EmptyEntry);
        }
        let token = self
            .session
            .access_token()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        self.status = SaveStatus::Saving;
        let request = self.draft.to_request();
        let row = self
            .entries
            .create_entry(&token, &request)
            .await
            .map_err(|e| {
                warn!("Saving entry failed: {e}");
                match e {
                    ClientError::NotAuthenticated
                    | ClientError::StorageUnavailable(_)
                    | ClientError::EmptyEntry
                    | ClientError::SaveFailed(_) => e,
                    other => ClientError::SaveFailed(other.to_string()),
                }
            })?;

        info!("Entry {} saved", row.id);
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::client::recorder::AudioRecorder;
    use crate::client::session::FixedSession;
    use crate::client::testing::{MockApi, MockInput};

    fn prompt() -> Prompt {
        Prompt {
            id: "fallback-5".to_string(),
            text: "Describe your favorite family tradition or holiday memory.".to_string(),
            category: "family".to_string(),
        }
    }

    fn composer(api: &MockApi) -> EntryComposer<MockApi, FixedSession> {
        EntryComposer::new(api.clone(), FixedSession::signed_in("tok"), Some(prompt()))
    }

    #[test]
    fn test_draft_emptiness() {
        let mut draft = Draft::default();
        assert!(draft.is_empty());
        draft.title = "Only a title".to_string();
        assert!(draft.is_empty());
        draft.content = "   ".to_string();
        assert!(draft.is_empty());
        draft.image_url = Some("https://blobs.test/images/1".to_string());
        assert!(!draft.is_empty());
    }

    #[test]
    fn test_to_request_trims_and_nulls() {
        let draft = Draft {
            prompt: Some(prompt()),
            title: "  Morning  ".to_string(),
            content: "\n".to_string(),
            audio: Some(AudioAttachment {
                url: "https://blobs.test/audio/1".to_string(),
                duration_secs: 0,
            }),
            image_url: None,
        };
        let request = draft.to_request();
        assert_eq!(request.prompt_id.as_deref(), Some("fallback-5"));
        assert_eq!(request.title.as_deref(), Some("Morning"));
        assert_eq!(request.content, None);
        assert_eq!(request.audio_duration, None);
    }

    #[tokio::test]
    async fn test_empty_save_sends_nothing() {
        let api = MockApi::default();
        let mut composer = composer(&api);

        let err = composer.save(|_| {}).await.unwrap_err();
        assert_eq!(err, ClientError::EmptyEntry);
        assert!(api.created().is_empty());
        assert_eq!(
            composer.status(),
            &SaveStatus::Failed(
                "Please write something, record audio, or add a photo before saving.".into()
            )
        );
    }

    #[tokio::test]
    async fn test_save_requires_session() {
        let api = MockApi::default();
        let mut composer =
            EntryComposer::new(api.clone(), FixedSession::signed_out(), Some(prompt()));
        composer.set_content("Dear diary");

        let err = composer.save(|_| {}).await.unwrap_err();
        assert_eq!(err, ClientError::NotAuthenticated);
        assert!(api.created().is_empty());
        assert_eq!(composer.draft().content, "Dear diary");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_notifies_then_clears_after_delay() {
        let api = MockApi::default();
        let mut composer = composer(&api);
        composer.set_title("Sunday");
        composer.set_content("  Pancakes with the kids  ");

        let notified = Cell::new(false);
        let start = tokio::time::Instant::now();
        let row = composer.save(|_| notified.set(true)).await.unwrap();

        assert!(notified.get());
        assert!(start.elapsed() >= SAVED_DISPLAY_DELAY);
        assert_eq!(row.content.as_deref(), Some("Pancakes with the kids"));
        assert_eq!(row.title.as_deref(), Some("Sunday"));

        let created = api.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "tok");
        assert_eq!(created[0].1.prompt_id.as_deref(), Some("fallback-5"));

        // cleared, prompt kept
        assert_eq!(composer.draft().content, "");
        assert_eq!(composer.draft().title, "");
        assert_eq!(composer.draft().prompt, Some(prompt()));
        assert_eq!(composer.status(), &SaveStatus::Editing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_save_still_clears_draft() {
        let api = MockApi::default();
        let mut composer = composer(&api);
        composer.set_content("Walked to the lake");

        let notified = Cell::new(false);
        let abandoned = tokio::time::timeout(
            Duration::from_millis(500),
            composer.save(|_| notified.set(true)),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(notified.get());
        assert_eq!(composer.draft().content, "");
        assert_eq!(composer.draft().prompt, Some(prompt()));
        assert_eq!(composer.status(), &SaveStatus::Editing);

        // the same entry cannot be submitted a second time
        let err = composer.save(|_| {}).await.unwrap_err();
        assert_eq!(err, ClientError::EmptyEntry);
        assert_eq!(api.created().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_unavailable_is_reported() {
        let api = MockApi::default();
        api.fail_saves(Some(ClientError::StorageUnavailable(
            "relation \"journal_entries\" does not exist".into(),
        )));
        let mut composer = composer(&api);
        composer.set_content("text");

        let err = composer.save(|_| {}).await.unwrap_err();
        assert!(matches!(err, ClientError::StorageUnavailable(_)));
        assert!(matches!(
            composer.status(),
            SaveStatus::Failed(m) if m.starts_with("Database setup required")
        ));
        assert_eq!(composer.draft().content, "text");
    }

    #[tokio::test]
    async fn test_other_failures_are_save_failed() {
        let api = MockApi::default();
        api.fail_saves(Some(ClientError::LoadFailed("connection reset".into())));
        let mut composer = composer(&api);
        composer.set_content("text");

        let err = composer.save(|_| {}).await.unwrap_err();
        assert!(matches!(err, ClientError::SaveFailed(_)));
    }

    #[test]
    fn test_title_is_capped() {
        let api = MockApi::default();
        let mut composer = composer(&api);
        composer.set_title(&"é".repeat(MAX_TITLE_CHARS + 20));
        assert_eq!(composer.draft().title.chars().count(), MAX_TITLE_CHARS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_only_entry_from_recording() {
        let api = MockApi::default();
        let mut recorder = AudioRecorder::new(MockInput::with_chunks(vec!["OggS"]), api.clone());
        let mut composer = composer(&api);

        recorder.start_recording().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_200)).await;
        recorder.stop_recording().await.unwrap();
        let attachment = recorder.upload().await.unwrap();
        composer.attach_audio(attachment);

        assert_eq!(
            composer.draft().audio,
            Some(AudioAttachment {
                url: "https://blobs.test/audio/1".to_string(),
                duration_secs: 5,
            })
        );

        composer.save(|_| {}).await.unwrap();
        let created = api.created();
        let request = &created[0].1;
        assert_eq!(request.content, None);
        assert_eq!(request.audio_url.as_deref(), Some("https://blobs.test/audio/1"));
        assert_eq!(request.audio_duration, Some(5));
        assert_eq!(request.image_url, None);
    }

    #[tokio::test]
    async fn test_image_attach_and_remove() {
        let api = MockApi::default();
        let mut composer = composer(&api);

        composer.attach_image("https://blobs.test/images/1".to_string());
        assert!(!composer.draft().is_empty());
        composer.remove_image();
        assert!(composer.draft().is_empty());
        assert_eq!(composer.save(|_| {}).await.unwrap_err(), ClientError::EmptyEntry);
    }
}
