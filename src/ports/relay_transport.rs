//! Relay Transport Port - How the widget client reaches the gateway.
//!
//! The client session only needs "send this text with this continuation
//! token and give me the reply". Whether the reply is a stream of relay
//! events or one JSON body depends on the transport's configured mode.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::foundation::ThreadId;
use crate::domain::relay::{RelayMode, StreamEvent};

/// Ordered relay events of one exchange.
pub type RelayEventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, TransportError>> + Send>>;

/// Port for client → gateway requests.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Sends one user message.
    async fn send(
        &self,
        message: &str,
        thread_id: Option<&ThreadId>,
    ) -> Result<RelayReply, TransportError>;

    /// Posts free-form feedback about a reply.
    async fn send_feedback(&self, payload: serde_json::Value) -> Result<(), TransportError>;

    /// The mode this transport was configured for.
    fn mode(&self) -> RelayMode;
}

/// Reply to one send.
pub enum RelayReply {
    /// Streaming mode: events in arrival order, ending with `Done`.
    Stream(RelayEventStream),
    /// Polling mode: the full reply at once.
    Complete {
        content: String,
        /// Thread created by this exchange, if any.
        thread_id: Option<ThreadId>,
    },
}

impl std::fmt::Debug for RelayReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("RelayReply::Stream(..)"),
            Self::Complete { content, thread_id } => f
                .debug_struct("RelayReply::Complete")
                .field("content", content)
                .field("thread_id", thread_id)
                .finish(),
        }
    }
}

/// Client-side transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The relay could not be reached or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The relay answered with a non-2xx status.
    #[error("relay returned status {status}")]
    Status {
        status: u16,
        /// Error text from the `{error}` body, when present.
        message: Option<String>,
    },

    /// The relay answered with an unexpected payload.
    #[error("malformed relay response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Error text the relay itself reported, if any.
    pub fn relay_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
