//! API handlers and shared utilities.
//!
//! Handlers validate input at the edge, delegate to the session lifecycle
//! engine, and map engine errors to HTTP status codes. Business rules live in
//! the engine, never here.

pub mod auth;
pub mod health;
pub mod password;
pub mod types;
pub mod users;
pub mod verification;

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::error;

use crate::auth::{AuthError, ErrorKind};
use types::MessageResponse;

/// Lightweight email sanity check used before persisting anything.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Passwords are accepted between 6 and 50 characters.
pub fn valid_password(password: &str) -> bool {
    (6..=50).contains(&password.chars().count())
}

/// Display names are accepted between 1 and 100 characters.
pub fn valid_name(name: &str) -> bool {
    (1..=100).contains(&name.chars().count())
}

/// Lowercase and trim so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Map an engine error to its HTTP response. Internal faults are logged and
/// replaced with a generic message.
pub fn error_response(err: &AuthError) -> Response {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Internal => {
            error!("request failed: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new("Internal server error")),
            )
                .into_response();
        }
    };
    (status, Json(MessageResponse::new(err.to_string()))).into_response()
}

fn validation_error(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(MessageResponse::new(message)),
    )
        .into_response()
}

fn missing_payload() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse::new("Missing payload")),
    )
        .into_response()
}

fn access_token_required() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(MessageResponse::new("Access token is required")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn emails_are_sanity_checked() {
        assert!(valid_email("alice@example.com"));
        assert!(!valid_email("alice"));
        assert!(!valid_email("alice@nodot"));
        assert!(!valid_email("a lice@example.com"));
    }

    #[test]
    fn password_and_name_lengths_are_bounded() {
        assert!(valid_password("hunter2"));
        assert!(!valid_password("short"));
        assert!(!valid_password(&"x".repeat(51)));
        assert!(valid_name("Alice"));
        assert!(!valid_name(""));
        assert!(!valid_name(&"x".repeat(101)));
    }

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn bearer_extraction_handles_both_prefixes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(extract_bearer_token(&headers), Some("xyz".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
