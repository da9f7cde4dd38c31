//! Assistant Provider Port - Interface for the hosted conversational assistant.
//!
//! The gateway needs very little from the upstream provider: a thread to hold
//! context, a way to post the user's message into it, and a run that produces
//! the reply, either as a lazy event sequence or as a status to poll.
//!
//! # Design
//!
//! - Threads are the provider's continuation mechanism; we only carry their ids
//! - Streaming runs yield `{kind, payload}` events, finite and non-restartable
//! - Polling runs expose status snapshots and the final reply text
//! - Error types cover the failure modes the relay reports to clients

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::domain::foundation::{RunId, ThreadId};

/// Lazy, finite, non-restartable sequence of run events.
pub type AssistantEventStream =
    Pin<Box<dyn Stream<Item = Result<AssistantEvent, AssistantError>> + Send>>;

/// Port for hosted assistant interactions.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Creates a new conversation thread and returns its id.
    async fn create_thread(&self) -> Result<ThreadId, AssistantError>;

    /// Appends a user message to the thread.
    async fn add_user_message(&self, thread_id: &ThreadId, content: &str)
        -> Result<(), AssistantError>;

    /// Starts a run on the thread and streams its events.
    async fn stream_run(&self, thread_id: &ThreadId) -> Result<AssistantEventStream, AssistantError>;

    /// Starts a run on the thread without streaming.
    async fn create_run(&self, thread_id: &ThreadId) -> Result<RunId, AssistantError>;

    /// Fetches the current status of a run.
    async fn run_status(&self, thread_id: &ThreadId, run_id: &RunId)
        -> Result<RunSnapshot, AssistantError>;

    /// Returns the text of the newest assistant message in the thread.
    async fn latest_reply(&self, thread_id: &ThreadId) -> Result<Option<String>, AssistantError>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// One event of a streaming run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantEvent {
    /// Incremental reply text.
    TextDelta(String),
    /// The run finished successfully.
    Completed,
    /// The run ended without a reply.
    Failed(String),
}

/// Status of a run as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// Returns true once the run will not change any more.
    ///
    /// `RequiresAction` counts as terminal: tool calls are never answered,
    /// so such a run would otherwise sit until it expires.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }

    /// Returns true if the run produced a reply.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Run status plus the provider's failure detail, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub last_error: Option<String>,
}

impl RunSnapshot {
    /// Creates a snapshot without failure detail.
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            last_error: None,
        }
    }

    /// Adds the provider's failure message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }

    /// Human-readable reason for a non-successful terminal status.
    pub fn failure_reason(&self) -> String {
        self.last_error
            .clone()
            .unwrap_or_else(|| format!("run ended with status {:?}", self.status))
    }
}

/// Assistant provider errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistantError {
    /// Provider is unavailable or answered with a server error.
    #[error("assistant unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// The provider reported a failed run.
    #[error("assistant run failed: {message}")]
    RunFailed {
        /// Failure reason from the provider.
        message: String,
    },

    /// API key rejected.
    #[error("assistant authentication failed")]
    AuthenticationFailed,

    /// Rate limited by provider.
    #[error("rate limited by assistant provider")]
    RateLimited,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider answered with an unexpected payload.
    #[error("malformed assistant response: {0}")]
    MalformedResponse(String),

    /// Request or polling timed out.
    #[error("assistant timed out after {timeout_secs}s")]
    Timeout {
        /// Bound that was exceeded.
        timeout_secs: u64,
    },
}

impl AssistantError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a run failed error.
    pub fn run_failed(message: impl Into<String>) -> Self {
        Self::RunFailed {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Returns true for a timeout of either the HTTP call or the poll loop.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
