//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `assistant` - Hosted assistant providers (OpenAI, scripted)
//! - `http` - Axum relay endpoints
//! - `relay_client` - Widget client transport to the relay
//! - `storage` - Client-local key/value storage (file, in-memory)
//! - `embed` - Host-page loader for the widget frame

pub mod assistant;
pub mod embed;
pub mod http;
pub mod relay_client;
pub mod storage;

pub use assistant::{OpenAIAssistant, OpenAIAssistantConfig, ScriptedAssistant};
pub use embed::{EmbedConfig, WidgetEmbed};
pub use relay_client::{HttpRelayClient, HttpRelayClientConfig};
pub use storage::{FileLocalStorage, InMemoryLocalStorage};
