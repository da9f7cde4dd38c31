//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Gateway Ports
//!
//! - `AssistantProvider` - Hosted assistant threads, runs and streamed output
//!
//! ## Client Ports
//!
//! - `RelayTransport` - Widget client → gateway requests
//! - `LocalStorage` - Client-local key/value persistence

mod assistant_provider;
mod local_storage;
mod relay_transport;

pub use assistant_provider::{
    AssistantError, AssistantEvent, AssistantEventStream, AssistantProvider, RunSnapshot,
    RunStatus,
};
pub use local_storage::{LocalStorage, StorageChange, StorageError};
pub use relay_transport::{RelayEventStream, RelayReply, RelayTransport, TransportError};
