//! Conversation domain module.
//!
//! The widget transcript, its continuation token, and the per-message
//! lifecycle (pending → streaming → complete / error).

mod conversation;
mod message;
mod status;
mod view;

pub use conversation::{Conversation, ConversationError};
pub use message::{ChatMessage, Role};
pub use status::MessageStatus;
pub use view::{ConversationView, MessageView, WidgetSettings};
