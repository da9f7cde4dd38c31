//! Widget relay server.
//!
//! Reads `WIDGET_RELAY__*` configuration, connects to the hosted assistant
//! and serves the relay endpoints plus the widget bundle.

use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use widget_relay::adapters::http::{relay_router, ChatAppState};
use widget_relay::adapters::{OpenAIAssistant, OpenAIAssistantConfig};
use widget_relay::application::RelayChatHandler;
use widget_relay::config::{AppConfig, ValidationError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let api_key = config
        .assistant
        .api_key
        .as_ref()
        .ok_or(ValidationError::MissingRequired("ASSISTANT__API_KEY"))?;
    let assistant_id = config
        .assistant
        .assistant_id
        .clone()
        .ok_or(ValidationError::MissingRequired("ASSISTANT__ASSISTANT_ID"))?;

    let assistant = OpenAIAssistant::new(
        OpenAIAssistantConfig::new(api_key.expose_secret().clone(), assistant_id)
            .with_base_url(&config.assistant.base_url)
            .with_timeout(config.assistant.timeout()),
    )?;

    let relay = RelayChatHandler::new(Arc::new(assistant))
        .with_polling(config.relay.poll_interval(), config.relay.max_poll_attempts);
    let state = ChatAppState::new(Arc::new(relay), config.relay.mode);
    let app = relay_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        mode = ?config.relay.mode,
        max_poll_wait_ms = config.relay.max_poll_wait().as_millis() as u64,
        "widget relay listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
