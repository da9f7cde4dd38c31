//! Assistant message lifecycle.
//!
//! Defines the states an assistant reply moves through and the valid
//! transitions between them.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle state of a single message.
///
/// Assistant replies move through these states:
/// - `Pending`: placeholder appended, nothing received yet
/// - `Streaming`: at least one fragment received, more may follow
/// - `Complete`: terminal, content is final
/// - `Error`: terminal, content holds the user-facing failure text
///
/// User messages are created `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Waiting for the first fragment.
    Pending,

    /// Receiving fragments.
    Streaming,

    /// Finished successfully.
    #[default]
    Complete,

    /// Finished with a failure.
    Error,
}

impl MessageStatus {
    /// Returns true while the UI should show a transient affordance.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Pending | Self::Streaming)
    }

    /// Used by serde to keep the persisted shape `{role, content}` for
    /// finished messages.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl StateMachine for MessageStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MessageStatus::*;
        matches!(
            (self, target),
            // First fragment arrives
            (Pending, Streaming) |
            // Single-shot reply (polling) or empty stream
            (Pending, Complete) |
            (Pending, Error) |
            (Streaming, Complete) |
            // Failure mid-stream
            (Streaming, Error)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MessageStatus::*;
        match self {
            Pending => vec![Streaming, Complete, Error],
            Streaming => vec![Complete, Error],
            Complete => vec![],
            Error => vec![],
        }
    }
}
