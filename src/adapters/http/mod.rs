//! HTTP adapters - REST API implementations.
//!
//! The relay exposes its chat, feedback and liveness endpoints here.

pub mod chat;

pub use chat::{chat_routes, relay_router, ChatAppState};
