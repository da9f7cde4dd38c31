//! Axum routes for the relay.
//!
//! Defines the routing table and the layers every relay deployment carries.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{chat, feedback, health, ChatAppState};
use crate::config::ServerConfig;
use crate::domain::relay::THREAD_ID_HEADER;

/// Creates routes for relay endpoints.
///
/// - POST /chat - Relay a message (SSE or JSON, per configured mode)
/// - POST /feedback - Accept feedback
/// - GET / - Liveness
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/", get(health))
        .route("/chat", post(chat))
        .route("/feedback", post(feedback))
}

/// Full relay application: endpoints, widget bundle, CORS and tracing.
pub fn relay_router(state: ChatAppState, server: &ServerConfig) -> Router {
    Router::new()
        .merge(chat_routes())
        .with_state(state)
        .nest_service(&server.static_prefix, ServeDir::new(&server.static_dir))
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(TraceLayer::new_for_http())
}

/// Allows the configured origins, or any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let thread_header = HeaderName::from_static(THREAD_ID_HEADER);

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, thread_header.clone()])
        .expose_headers([thread_header]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::assistant::ScriptedAssistant;
    use crate::application::handlers::relay::RelayChatHandler;
    use crate::domain::relay::RelayMode;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(mode: RelayMode) -> ChatAppState {
        let relay = RelayChatHandler::new(Arc::new(ScriptedAssistant::new()));
        ChatAppState::new(Arc::new(relay), mode)
    }

    #[test]
    fn cors_layer_accepts_configured_origins() {
        let _layer = cors_layer(&["https://shop.example.com".to_string()]);
        let _any = cors_layer(&[]);
    }

    #[tokio::test]
    async fn root_is_live() {
        let app = chat_routes().with_state(state(RelayMode::Streaming));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_rejects_non_json_body() {
        let app = chat_routes().with_state(state(RelayMode::Polling));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_streams_event_stream_in_streaming_mode() {
        let app = chat_routes().with_state(state(RelayMode::Streaming));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message":"Hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn unknown_static_asset_is_404() {
        let app = relay_router(state(RelayMode::Streaming), &ServerConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/widget/missing.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
