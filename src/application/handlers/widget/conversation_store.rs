//! ConversationStore - Persists the widget conversation in local storage.
//!
//! Two keys hold the whole state: `chatThreadId` (continuation token) and
//! `chatMessages` (JSON array of `{role, content}`). They are always written
//! and removed together.

use std::sync::Arc;

use crate::domain::conversation::{ChatMessage, Conversation};
use crate::domain::foundation::ThreadId;
use crate::ports::{LocalStorage, StorageError};

/// Storage key of the continuation token.
pub const THREAD_ID_KEY: &str = "chatThreadId";

/// Storage key of the message log.
pub const MESSAGES_KEY: &str = "chatMessages";

/// Loads and saves one client's conversation.
#[derive(Clone)]
pub struct ConversationStore {
    storage: Arc<dyn LocalStorage>,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Loads the persisted conversation, or an empty one.
    ///
    /// Replies persisted mid-stream come back as errors carrying
    /// `interrupted_notice`. An unreadable message log is discarded along
    /// with its token.
    pub async fn load(&self, interrupted_notice: &str) -> Result<Conversation, StorageError> {
        let thread_id = self.storage.get_item(THREAD_ID_KEY).await?;
        let messages = self.storage.get_item(MESSAGES_KEY).await?;

        let messages: Vec<ChatMessage> = match messages {
            None => Vec::new(),
            Some(json) => match serde_json::from_str(&json) {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable chat history");
                    return Ok(Conversation::new());
                }
            },
        };

        let thread_id = thread_id.and_then(|raw| match ThreadId::new(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "discarding invalid stored thread id");
                None
            }
        });

        Ok(Conversation::restore(thread_id, messages, interrupted_notice))
    }

    /// Persists token and log in one batch.
    pub async fn save(&self, conversation: &Conversation) -> Result<(), StorageError> {
        let messages = serde_json::to_string(conversation.messages())
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        self.storage
            .write_batch(vec![
                (
                    THREAD_ID_KEY.to_string(),
                    conversation.thread_id().map(ToString::to_string),
                ),
                (MESSAGES_KEY.to_string(), Some(messages)),
            ])
            .await
    }

    /// Removes token and log together.
    pub async fn reset(&self) -> Result<(), StorageError> {
        self.storage.remove_items(&[THREAD_ID_KEY, MESSAGES_KEY]).await
    }
}
