//! Relay operating mode.

use serde::{Deserialize, Serialize};

/// How `/chat` delivers the assistant reply.
///
/// A deployment picks exactly one; clients are configured with the same
/// mode and never fall back to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Server-sent events with incremental `content` frames.
    #[default]
    Streaming,
    /// One JSON body once the upstream run reaches a terminal status.
    Polling,
}

impl RelayMode {
    /// Content type of a successful `/chat` response in this mode.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Streaming => "text/event-stream",
            Self::Polling => "application/json",
        }
    }
}
