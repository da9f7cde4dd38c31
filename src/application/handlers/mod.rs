//! Application handlers.
//!
//! - `relay` - Gateway side: one message in, one relayed reply out
//! - `widget` - Client side: message state, persistence, observers

pub mod relay;
pub mod widget;

pub use relay::{PolledReply, RelayChatCommand, RelayChatHandler, RelayError, RelayStream};
pub use widget::{ChatSession, ClientError, ConversationStore, MESSAGES_KEY, THREAD_ID_KEY};
