//! Widget Relay - Embeddable chat widget backed by a hosted assistant
//!
//! This crate contains the relay gateway that forwards widget messages to a
//! hosted assistant and streams replies back, plus the widget-side client:
//! message state machine, conversation persistence and the embed loader.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
