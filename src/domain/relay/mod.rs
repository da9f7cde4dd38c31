//! Relay protocol domain.
//!
//! The normalized event framing the gateway speaks to widget clients, and
//! the scrubbing applied to provider text before it is relayed.

mod citation;
mod events;
mod mode;

pub use citation::{strip_citations, CitationScrubber};
pub use events::{
    StreamEvent, StreamEventError, DONE_SENTINEL, MAX_MESSAGE_LENGTH, THREAD_ID_HEADER,
};
pub use mode::RelayMode;
