//! Foundation module - Shared domain primitives.
//!
//! Identifiers, the state machine trait, and validation errors used by the
//! conversation and relay modules.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{RunId, ThreadId, WidgetInstanceId};
pub use state_machine::StateMachine;
