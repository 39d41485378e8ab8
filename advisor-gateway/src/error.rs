use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// A handler failure converted to the wire shape the front end expects:
/// `{ "error": <message> }` plus upstream detail when there is any.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    /// Missing input: reported with no side effects.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            details: None,
        }
    }

    /// Upstream-service failure: generic message plus detail where available.
    pub fn upstream(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
            details,
        }
    }

    pub fn from_transport(message: &'static str, err: anyhow::Error) -> Self {
        Self::upstream(message, Some(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::warn!(
            "{} ({}): {}",
            self.message,
            self.status,
            self.details.as_deref().unwrap_or("no detail")
        );

        let mut body = json!({ "error": self.message });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let err = ApiError::bad_request("No file");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.details.is_none());
    }

    #[test]
    fn upstream_failure_carries_detail() {
        let err = ApiError::upstream("Upload failed", Some("quota exceeded".into()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.details.as_deref(), Some("quota exceeded"));
    }
}
