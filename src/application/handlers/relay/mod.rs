//! Relay gateway handlers.

mod relay_chat;

pub use relay_chat::{PolledReply, RelayChatCommand, RelayChatHandler, RelayError, RelayStream};
