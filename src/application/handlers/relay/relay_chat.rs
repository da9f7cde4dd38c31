//! RelayChatHandler - Relays one user message to the hosted assistant.
//!
//! Streaming mode turns the provider's run events into the widget's
//! `info` / `content` / `error` / `[DONE]` framing. Polling mode drives a
//! run to a terminal status and returns the full reply at once.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::{ThreadId, ValidationError};
use crate::domain::relay::{strip_citations, CitationScrubber, StreamEvent, MAX_MESSAGE_LENGTH};
use crate::ports::{AssistantError, AssistantEvent, AssistantProvider};

/// Relay events in the order they go out to the client.
pub type RelayStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Command to relay one user message.
#[derive(Debug, Clone)]
pub struct RelayChatCommand {
    pub message: String,
    /// Continuation token from the client, if it has one.
    pub thread_id: Option<ThreadId>,
}

impl RelayChatCommand {
    /// Builds a command, rejecting blank and oversized messages.
    pub fn new(message: impl Into<String>, thread_id: Option<ThreadId>) -> Result<Self, RelayError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ValidationError::empty_field("message").into());
        }
        let length = message.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(ValidationError::too_long("message", MAX_MESSAGE_LENGTH, length).into());
        }
        Ok(Self { message, thread_id })
    }
}

/// Full reply of a polled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledReply {
    pub content: String,
    pub thread_id: ThreadId,
    /// True when this exchange created the thread.
    pub thread_created: bool,
}

/// Errors surfaced by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] ValidationError),

    #[error("Assistant unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Assistant run failed: {0}")]
    UpstreamRunFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed assistant response: {0}")]
    MalformedResponse(String),

    #[error("Assistant did not finish within {waited_ms}ms")]
    Timeout { waited_ms: u64 },
}

impl From<AssistantError> for RelayError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Unavailable { message } => Self::UpstreamUnavailable(message),
            AssistantError::AuthenticationFailed => {
                Self::UpstreamUnavailable("authentication with the assistant failed".to_string())
            }
            AssistantError::RateLimited => {
                Self::UpstreamUnavailable("the assistant is rate limiting requests".to_string())
            }
            AssistantError::RunFailed { message } => Self::UpstreamRunFailed(message),
            AssistantError::Network(message) => Self::NetworkError(message),
            AssistantError::MalformedResponse(message) => Self::MalformedResponse(message),
            AssistantError::Timeout { timeout_secs } => Self::Timeout {
                waited_ms: timeout_secs.saturating_mul(1000),
            },
        }
    }
}

/// Handler for relaying chat messages.
pub struct RelayChatHandler {
    assistant: Arc<dyn AssistantProvider>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl RelayChatHandler {
    pub fn new(assistant: Arc<dyn AssistantProvider>) -> Self {
        Self {
            assistant,
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 60,
        }
    }

    /// Sets the polling cadence and bound.
    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts.max(1);
        self
    }

    /// Relays the message and streams the reply.
    ///
    /// The returned stream never fails: any error becomes an `Error` event.
    /// It always ends with exactly one `Done`.
    pub fn handle_streaming(&self, cmd: RelayChatCommand) -> RelayStream {
        let assistant = Arc::clone(&self.assistant);

        let stream = async_stream::stream! {
            let (thread_id, created) = match resolve_thread(assistant.as_ref(), cmd.thread_id).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::warn!(provider = assistant.name(), error = %e, "thread creation failed");
                    yield StreamEvent::error(e.to_string());
                    yield StreamEvent::Done;
                    return;
                }
            };
            if created {
                yield StreamEvent::Info { thread_id: thread_id.clone() };
            }

            if let Err(e) = assistant.add_user_message(&thread_id, &cmd.message).await {
                let e = RelayError::from(e);
                tracing::warn!(thread_id = %thread_id, error = %e, "posting user message failed");
                yield StreamEvent::error(e.to_string());
                yield StreamEvent::Done;
                return;
            }

            let mut events = match assistant.stream_run(&thread_id).await {
                Ok(events) => events,
                Err(e) => {
                    let e = RelayError::from(e);
                    tracing::warn!(thread_id = %thread_id, error = %e, "starting run failed");
                    yield StreamEvent::error(e.to_string());
                    yield StreamEvent::Done;
                    return;
                }
            };

            let mut scrubber = CitationScrubber::new();
            let mut fragments = 0usize;
            while let Some(event) = events.next().await {
                match event {
                    Ok(AssistantEvent::TextDelta(text)) => {
                        let Some(cleaned) = scrubber.scrub(&text) else {
                            continue;
                        };
                        fragments += 1;
                        yield StreamEvent::Content(cleaned);
                    }
                    Ok(AssistantEvent::Completed) => break,
                    Ok(AssistantEvent::Failed(reason)) => {
                        let e = RelayError::UpstreamRunFailed(reason);
                        tracing::warn!(thread_id = %thread_id, fragments, error = %e, "run failed");
                        yield StreamEvent::error(e.to_string());
                        yield StreamEvent::Done;
                        return;
                    }
                    Err(e) => {
                        let e = RelayError::from(e);
                        tracing::warn!(thread_id = %thread_id, fragments, error = %e, "run stream broke");
                        yield StreamEvent::error(e.to_string());
                        yield StreamEvent::Done;
                        return;
                    }
                }
            }

            tracing::info!(thread_id = %thread_id, created, fragments, "reply relayed");
            yield StreamEvent::Done;
        };

        Box::pin(stream)
    }

    /// Relays the message and waits for the whole reply.
    pub async fn handle_polling(&self, cmd: RelayChatCommand) -> Result<PolledReply, RelayError> {
        let assistant = self.assistant.as_ref();

        let (thread_id, thread_created) = resolve_thread(assistant, cmd.thread_id).await?;
        assistant.add_user_message(&thread_id, &cmd.message).await?;
        let run_id = assistant.create_run(&thread_id).await?;

        for attempt in 1..=self.max_poll_attempts {
            let snapshot = assistant.run_status(&thread_id, &run_id).await?;
            tracing::debug!(thread_id = %thread_id, run_id = %run_id, attempt, status = ?snapshot.status, "polled run");

            if snapshot.status.is_success() {
                let reply = assistant
                    .latest_reply(&thread_id)
                    .await?
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| {
                        RelayError::MalformedResponse("assistant returned no reply".to_string())
                    })?;

                tracing::info!(thread_id = %thread_id, created = thread_created, attempt, "reply relayed");
                return Ok(PolledReply {
                    content: strip_citations(&reply),
                    thread_id,
                    thread_created,
                });
            }
            if snapshot.status.is_terminal() {
                let e = RelayError::UpstreamRunFailed(snapshot.failure_reason());
                tracing::warn!(thread_id = %thread_id, run_id = %run_id, error = %e, "run failed");
                return Err(e);
            }

            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        // One sleep between consecutive polls, none after the last.
        let waited_ms = self.poll_interval.as_millis() as u64 * u64::from(self.max_poll_attempts - 1);
        tracing::warn!(thread_id = %thread_id, run_id = %run_id, waited_ms, "run did not finish");
        Err(RelayError::Timeout { waited_ms })
    }
}

/// Reuses the client's thread or creates one.
async fn resolve_thread(
    assistant: &dyn AssistantProvider,
    thread_id: Option<ThreadId>,
) -> Result<(ThreadId, bool), RelayError> {
    match thread_id {
        Some(thread_id) => {
            tracing::debug!(thread_id = %thread_id, "reusing thread");
            Ok((thread_id, false))
        }
        None => {
            let thread_id = assistant.create_thread().await?;
            tracing::debug!(thread_id = %thread_id, "created thread");
            Ok((thread_id, true))
        }
    }
}
