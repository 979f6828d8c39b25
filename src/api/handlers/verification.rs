//! Email verification endpoints.

use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use std::sync::Arc;

use super::types::{MessageResponse, SessionResponse, VerifyEmailRequest};
use super::{access_token_required, error_response, extract_bearer_token, missing_payload, validation_error};
use crate::auth::AuthEngine;
use crate::auth::engine::{ResendOutcome, VerifyEmailOutcome};

/// Consume the emailed token and activate the account. Clicking an already
/// consumed link reports success instead of failing.
#[utoipa::path(
    post,
    path = "/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified, fresh session started", body = SessionResponse),
        (status = 401, description = "Email verify token is invalid", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let token = request.email_verify_token.trim();
    if token.is_empty() {
        return validation_error("Email verify token is required");
    }

    match engine.verify_email(token).await {
        Ok(VerifyEmailOutcome::Verified(tokens)) => Json(SessionResponse {
            message: "Email verify success".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
        .into_response(),
        Ok(VerifyEmailOutcome::AlreadyVerified) => {
            Json(MessageResponse::new("Email already verified before")).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// Issue a fresh verification token for the authenticated user; any earlier
/// token stops working.
#[utoipa::path(
    post,
    path = "/v1/auth/resend-verification",
    responses(
        (status = 200, description = "Verification email sent", body = MessageResponse),
        (status = 401, description = "Access token is required", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
) -> impl IntoResponse {
    let Some(access_token) = extract_bearer_token(&headers) else {
        return access_token_required();
    };
    let payload = match engine.authenticate(&access_token) {
        Ok(payload) => payload,
        Err(err) => return error_response(&err),
    };

    match engine.resend_verify_email(payload.user_id).await {
        Ok(ResendOutcome::Sent) => {
            Json(MessageResponse::new("Resend verification email success")).into_response()
        }
        Ok(ResendOutcome::AlreadyVerified) => {
            Json(MessageResponse::new("Email already verified before")).into_response()
        }
        Err(err) => error_response(&err),
    }
}
