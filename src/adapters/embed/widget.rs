//! Embedding loader for host pages.
//!
//! A host page drops in one script and calls the loader with an options
//! object; the loader adds a floating toggle button and a hidden frame that
//! shows the widget bundle. Each call yields an independent [`WidgetEmbed`]
//! with its own element ids, so several widgets can share a page.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::WidgetInstanceId;

/// Options accepted by the loader, in the host page's camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedConfig {
    /// Widget configuration id, forwarded to the frame as `?id=`.
    pub id: Option<String>,
    /// Full frame URL, replacing the bundled `index.html`.
    pub api: Option<String>,
    pub button_margin: String,
    pub button_size: String,
    pub button_color: String,
    pub button_background_color: String,
    pub iframe_width: String,
    pub iframe_height: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            id: None,
            api: None,
            button_margin: "1rem".to_string(),
            button_size: "3.5rem".to_string(),
            button_color: "white".to_string(),
            button_background_color: "#2563eb".to_string(),
            iframe_width: "400px".to_string(),
            iframe_height: "600px".to_string(),
        }
    }
}

/// One embedded widget instance.
#[derive(Debug, Clone)]
pub struct WidgetEmbed {
    instance: WidgetInstanceId,
    config: EmbedConfig,
    base_url: String,
    open: bool,
}

impl WidgetEmbed {
    /// Creates an instance for a loader script served from `script_url`.
    ///
    /// The bundle's `index.html` is looked up next to the script.
    pub fn new(config: EmbedConfig, script_url: &str) -> Self {
        let base_url = match script_url.rfind('/') {
            Some(idx) => script_url[..=idx].to_string(),
            None => String::new(),
        };

        Self {
            instance: WidgetInstanceId::new(),
            config,
            base_url,
            open: false,
        }
    }

    pub fn instance_id(&self) -> WidgetInstanceId {
        self.instance
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flips frame visibility and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn frame_element_id(&self) -> String {
        format!("widget-relay-frame-{}", self.instance.short())
    }

    pub fn button_element_id(&self) -> String {
        format!("widget-relay-button-{}", self.instance.short())
    }

    /// URL the frame loads.
    pub fn iframe_src(&self) -> String {
        if let Some(api) = self.config.api.as_deref().filter(|a| !a.is_empty()) {
            return api.to_string();
        }

        let mut src = format!("{}index.html", self.base_url);
        if let Some(id) = self.config.id.as_deref().filter(|id| !id.is_empty()) {
            src.push_str("?id=");
            src.push_str(&urlencoding::encode(id));
        }
        src
    }

    /// Markup for the frame and its toggle button.
    pub fn render(&self) -> String {
        let c = &self.config;
        let display = if self.open { "block" } else { "none" };

        let frame = format!(
            r#"<iframe id="{id}" src="{src}" style="position:fixed;bottom:{margin};right:{margin};width:{width};height:{height};border:none;z-index:999999;border-radius:12px;box-shadow:0 4px 12px rgba(0, 0, 0, 0.2);display:{display}"></iframe>"#,
            id = self.frame_element_id(),
            src = escape_attr(&self.iframe_src()),
            margin = escape_attr(&c.button_margin),
            width = escape_attr(&c.iframe_width),
            height = escape_attr(&c.iframe_height),
            display = display,
        );

        let button = format!(
            r#"<button id="{id}" type="button" aria-controls="{frame_id}" aria-expanded="{open}" style="position:fixed;bottom:{margin};right:{margin};width:{size};height:{size};background-color:{bg};color:{fg};border-radius:50%;border:none;cursor:pointer;font-size:1.5rem;z-index:999998">&#128172;</button>"#,
            id = self.button_element_id(),
            frame_id = self.frame_element_id(),
            open = self.open,
            margin = escape_attr(&c.button_margin),
            size = escape_attr(&c.button_size),
            bg = escape_attr(&c.button_background_color),
            fg = escape_attr(&c.button_color),
        );

        format!("{}\n{}", frame, button)
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
