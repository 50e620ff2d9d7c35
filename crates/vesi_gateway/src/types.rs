use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply to `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    /// Mood score after this turn, 0..=100.
    pub mood: u8,
    /// Link to the synthesized reply; absent when speech is off or failed.
    pub audio_url: Option<String>,
}

/// Reply to `POST /transcribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// JSON error with the status it travels with.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_json() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert!(serde_json::from_str::<ChatRequest>(r#"{"text":"hi"}"#).is_err());
    }

    #[test]
    fn test_chat_response_json() {
        let resp = ChatResponse {
            text: "Hmph.".into(),
            mood: 60,
            audio_url: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["mood"], 60);
        assert!(json["audio_url"].is_null());
    }

    #[test]
    fn test_api_error_status() {
        let resp = ApiError::upstream("model down").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
