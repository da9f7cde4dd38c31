//! Relay stream events.
//!
//! Defines the protocol between the gateway and widget clients:
//! - `info`: continuation token for a newly created thread
//! - `content`: one incremental text fragment
//! - `error`: human-readable failure
//! - `done`: terminal sentinel, framed as the literal `[DONE]`
//!
//! Each event travels as one SSE `data:` line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::ThreadId;

/// Literal payload of the terminal frame.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Maximum accepted user message length (10,000 characters).
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Header carrying the continuation token in both directions.
pub const THREAD_ID_HEADER: &str = "x-thread-id";

/// One event of a relay stream.
///
/// A well-formed stream is: at most one `Info` (only when a thread was
/// created), zero or more `Content`, an optional `Error`, then `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A new upstream thread was created for this exchange.
    Info { thread_id: ThreadId },
    /// Incremental reply text.
    Content(String),
    /// The exchange failed.
    Error(String),
    /// End of stream.
    Done,
}

/// Errors decoding a relay frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamEventError {
    #[error("malformed relay event: {0}")]
    Malformed(String),
}

/// JSON shape of non-terminal frames.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireEvent {
    Info(WireInfo),
    Content(String),
    Error(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct WireInfo {
    id: String,
}

impl StreamEvent {
    /// Creates a content event.
    pub fn content(fragment: impl Into<String>) -> Self {
        Self::Content(fragment.into())
    }

    /// Creates an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Returns true for the end-of-stream sentinel.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Encodes the event as the payload of an SSE `data:` line.
    pub fn to_sse_data(&self) -> String {
        let wire = match self {
            Self::Done => return DONE_SENTINEL.to_string(),
            Self::Info { thread_id } => WireEvent::Info(WireInfo {
                id: thread_id.to_string(),
            }),
            Self::Content(text) => WireEvent::Content(text.clone()),
            Self::Error(message) => WireEvent::Error(message.clone()),
        };
        // Plain enums of strings always serialize.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Decodes the payload of an SSE `data:` line.
    pub fn from_sse_data(data: &str) -> Result<Self, StreamEventError> {
        let data = data.trim();
        if data == DONE_SENTINEL {
            return Ok(Self::Done);
        }

        let wire: WireEvent = serde_json::from_str(data)
            .map_err(|e| StreamEventError::Malformed(format!("{e}: {data}")))?;

        Ok(match wire {
            WireEvent::Info(info) => Self::Info {
                thread_id: ThreadId::new(info.id)
                    .map_err(|e| StreamEventError::Malformed(e.to_string()))?,
            },
            WireEvent::Content(text) => Self::Content(text),
            WireEvent::Error(message) => Self::Error(message),
        })
    }
}
