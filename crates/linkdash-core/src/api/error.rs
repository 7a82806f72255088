use reqwest::StatusCode;
use thiserror::Error;

use crate::models::ErrorBody;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 or 403: the session is no longer accepted.
    #[error("Unauthorized ({0}) - session expired or revoked")]
    Unauthorized(StatusCode),

    /// Any other non-2xx. `message` is the server's `error` field, if present.
    #[error("Request rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ApiError::Unauthorized(status),
            _ => {
                let message = serde_json::from_str::<ErrorBody>(body)
                    .ok()
                    .and_then(|b| b.error)
                    .filter(|m| !m.is_empty());
                ApiError::Rejected { status, message }
            }
        }
    }

    /// True for 401/403, which must force a logout.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Server-provided message for an application error, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Message for the operator: the server's own text when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_auth_failures() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_auth_failure());
        assert!(ApiError::from_status(StatusCode::FORBIDDEN, "{}").is_auth_failure());
        assert!(!ApiError::from_status(StatusCode::NOT_FOUND, "").is_auth_failure());
    }

    #[test]
    fn test_from_status_extracts_server_message() {
        let err = ApiError::from_status(StatusCode::CONFLICT, r#"{"error":"Slug sudah ada"}"#);
        assert_eq!(err.server_message(), Some("Slug sudah ada"));
        assert_eq!(err.user_message("Failed to create link"), "Slug sudah ada");
    }

    #[test]
    fn test_from_status_falls_back_without_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "not json");
        assert_eq!(err.server_message(), None);
        assert_eq!(err.user_message("Failed to create link"), "Failed to create link");

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":""}"#);
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(ApiError::truncate_body("short"), "short");
        let long = "x".repeat(600);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.ends_with("(truncated, 600 total bytes)"));
    }
}
