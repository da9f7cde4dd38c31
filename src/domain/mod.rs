//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, state machine trait, errors)
//! - `conversation` - Widget transcript, message lifecycle, render projection
//! - `relay` - Gateway ↔ client event framing and citation scrubbing

pub mod conversation;
pub mod foundation;
pub mod relay;
