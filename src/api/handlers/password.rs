//! Password recovery and change endpoints.

use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use std::sync::Arc;

use super::types::{
    ChangePasswordRequest, ForgotPasswordRequest, MessageResponse, ResetPasswordRequest,
};
use super::{
    access_token_required, error_response, extract_bearer_token, missing_payload, normalize_email,
    valid_email, valid_password, validation_error,
};
use crate::auth::AuthEngine;

#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return validation_error("Email is invalid");
    }

    match engine.forgot_password(&email).await {
        Ok(()) => Json(MessageResponse::new("Check email to reset password")).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 401, description = "Forgot password token is invalid", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let token = request.forgot_password_token.trim();
    if token.is_empty() {
        return validation_error("Forgot password token is required");
    }
    if !valid_password(&request.password) {
        return validation_error("Password length must be from 6 to 50 characters");
    }
    if request.password != request.confirm_password {
        return validation_error("Passwords do not match");
    }

    match engine.reset_password(token, &request.password).await {
        Ok(()) => Json(MessageResponse::new("Reset password successfully")).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    put,
    path = "/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Password is incorrect", body = MessageResponse),
        (status = 422, description = "Old password and new password must be different", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> impl IntoResponse {
    let Some(access_token) = extract_bearer_token(&headers) else {
        return access_token_required();
    };
    let claims = match engine.authenticate(&access_token) {
        Ok(claims) => claims,
        Err(err) => return error_response(&err),
    };

    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if !valid_password(&request.password) {
        return validation_error("Password length must be from 6 to 50 characters");
    }
    if request.password != request.confirm_password {
        return validation_error("Passwords do not match");
    }

    match engine
        .change_password(claims.user_id, &request.old_password, &request.password)
        .await
    {
        Ok(()) => Json(MessageResponse::new("Change password successfully")).into_response(),
        Err(err) => error_response(&err),
    }
}
