//! Host page embedding.

mod widget;

pub use widget::{EmbedConfig, WidgetEmbed};
