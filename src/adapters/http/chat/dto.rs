//! HTTP DTOs for the relay endpoints.
//!
//! These are the exact JSON shapes widget clients exchange with the relay.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Polling-mode reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReplyResponse {
    pub content: String,
}

/// Acknowledgement for `POST /feedback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub message: String,
}

impl FeedbackResponse {
    pub fn ok() -> Self {
        Self {
            message: "OK".to_string(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response
// ════════════════════════════════════════════════════════════════════════════════

/// Error body shared by every non-2xx relay response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_is_a_single_field() {
        let json = serde_json::to_string(&ErrorResponse::new("timed out")).unwrap();
        assert_eq!(json, r#"{"error":"timed out"}"#);
    }

    #[test]
    fn feedback_ack_matches_wire_shape() {
        let json = serde_json::to_string(&FeedbackResponse::ok()).unwrap();
        assert_eq!(json, r#"{"message":"OK"}"#);
    }

    #[test]
    fn chat_request_deserializes() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"Hi"}"#).unwrap();
        assert_eq!(req.message, "Hi");
    }
}
