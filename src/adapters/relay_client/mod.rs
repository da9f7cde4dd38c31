//! Relay Transport Adapters.
//!
//! - `HttpRelayClient` - reqwest client for a deployed relay gateway

mod http_relay_client;

pub use http_relay_client::{HttpRelayClient, HttpRelayClientConfig};
