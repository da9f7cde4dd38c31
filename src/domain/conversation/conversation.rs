//! Conversation aggregate.
//!
//! Owns the continuation token and the ordered transcript. All mutation of
//! an in-flight reply goes through here so the message lifecycle rules are
//! enforced in one place.

use thiserror::Error;

use super::{ChatMessage, MessageStatus, Role};
use crate::domain::foundation::{ThreadId, ValidationError};

/// Errors raised by conversation mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("A reply is already in flight")]
    ReplyInFlight,

    #[error("No reply is in flight")]
    NoReplyInFlight,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Continuation token plus append-only transcript.
///
/// # Invariants
///
/// - `thread_id` is `None` until the first exchange creates one
/// - At most one assistant message is non-terminal, and it is the last one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    thread_id: Option<ThreadId>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a conversation from persisted parts.
    ///
    /// Replies that were still pending or streaming when they were persisted
    /// can never finish, so they are failed with `interrupted_notice`.
    pub fn restore(
        thread_id: Option<ThreadId>,
        mut messages: Vec<ChatMessage>,
        interrupted_notice: &str,
    ) -> Self {
        for message in messages.iter_mut().filter(|m| m.status().is_transient()) {
            // Transient states always allow Error.
            let _ = message.fail(interrupted_notice);
        }
        Self { thread_id, messages }
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        self.thread_id.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.thread_id.is_none() && self.messages.is_empty()
    }

    /// Returns true while the last message is an unfinished reply.
    pub fn is_awaiting_reply(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role() == Role::Assistant && m.status().is_transient())
    }

    /// Appends the user's message and an empty reply placeholder.
    ///
    /// This is the optimistic step of a send: both entries exist before any
    /// network activity starts.
    pub fn begin_exchange(&mut self, text: &str) -> Result<(), ConversationError> {
        if self.is_awaiting_reply() {
            return Err(ConversationError::ReplyInFlight);
        }
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("message").into());
        }
        self.messages.push(ChatMessage::user(text));
        self.messages.push(ChatMessage::pending_reply());
        Ok(())
    }

    /// Stores the continuation token announced by the relay.
    pub fn set_thread_id(&mut self, thread_id: ThreadId) {
        self.thread_id = Some(thread_id);
    }

    /// Appends a streamed fragment to the in-flight reply.
    pub fn append_to_reply(&mut self, fragment: &str) -> Result<(), ConversationError> {
        self.reply_mut()?.append(fragment)?;
        Ok(())
    }

    /// Replaces the in-flight reply with a complete answer.
    pub fn replace_reply(&mut self, content: &str) -> Result<(), ConversationError> {
        self.reply_mut()?.replace(content)?;
        Ok(())
    }

    /// Marks the in-flight reply complete.
    pub fn complete_reply(&mut self) -> Result<(), ConversationError> {
        self.reply_mut()?.complete()?;
        Ok(())
    }

    /// Fails the in-flight reply with a user-facing notice.
    pub fn fail_reply(&mut self, notice: &str) -> Result<(), ConversationError> {
        self.reply_mut()?.fail(notice)?;
        Ok(())
    }

    /// Status of the in-flight or most recent reply.
    pub fn reply_status(&self) -> Option<MessageStatus> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == Role::Assistant)
            .map(ChatMessage::status)
    }

    /// Drops the token and the transcript together.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn reply_mut(&mut self) -> Result<&mut ChatMessage, ConversationError> {
        match self.messages.last_mut() {
            Some(m) if m.role() == Role::Assistant && m.status().is_transient() => Ok(m),
            _ => Err(ConversationError::NoReplyInFlight),
        }
    }
}
