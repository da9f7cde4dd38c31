//! Widget client handlers.

mod chat_session;
mod conversation_store;

pub use chat_session::{ChatSession, ClientError};
pub use conversation_store::{ConversationStore, MESSAGES_KEY, THREAD_ID_KEY};
