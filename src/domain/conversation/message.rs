//! Message entity for the widget transcript.
//!
//! A message is `{role, content}`. Assistant replies start as an empty
//! placeholder and accumulate content until they reach a terminal status.

use serde::{Deserialize, Serialize};

use super::MessageStatus;
use crate::domain::foundation::{StateMachine, ValidationError};

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user input.
    User,
    /// Assistant reply.
    Assistant,
}

/// One entry of the transcript.
///
/// # Invariants
///
/// - User messages are always `Complete`
/// - Content of a terminal message never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "MessageStatus::is_complete")]
    status: MessageStatus,
}

impl ChatMessage {
    /// Creates a finished user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            status: MessageStatus::Complete,
        }
    }

    /// Creates a finished assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            status: MessageStatus::Complete,
        }
    }

    /// Creates the empty placeholder shown while waiting for a reply.
    pub fn pending_reply() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            status: MessageStatus::Pending,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    /// Appends a streamed fragment, moving `Pending` to `Streaming`.
    pub fn append(&mut self, fragment: &str) -> Result<(), ValidationError> {
        match self.status {
            MessageStatus::Streaming => {}
            status => self.status = status.transition_to(MessageStatus::Streaming)?,
        }
        self.content.push_str(fragment);
        Ok(())
    }

    /// Replaces the placeholder with a full reply in one step.
    pub fn replace(&mut self, content: impl Into<String>) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(MessageStatus::Complete)?;
        self.content = content.into();
        Ok(())
    }

    /// Marks the accumulated content final.
    pub fn complete(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(MessageStatus::Complete)?;
        Ok(())
    }

    /// Replaces whatever was received with a user-facing failure text.
    pub fn fail(&mut self, notice: impl Into<String>) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(MessageStatus::Error)?;
        self.content = notice.into();
        Ok(())
    }
}
