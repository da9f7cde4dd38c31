//! Application layer - Handlers that orchestrate domain operations.
//!
//! The relay side turns one user message into an assistant exchange; the
//! widget side drives a conversation against the relay.

pub mod handlers;

pub use handlers::{
    // Relay
    PolledReply, RelayChatCommand, RelayChatHandler, RelayError, RelayStream,
    // Widget client
    ChatSession, ClientError, ConversationStore,
};
