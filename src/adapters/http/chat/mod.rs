//! HTTP adapter for the relay gateway.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ChatReplyResponse, ChatRequest, ErrorResponse, FeedbackResponse};
pub use handlers::{ChatApiError, ChatAppState};
pub use routes::{chat_routes, relay_router};
