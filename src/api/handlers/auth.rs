//! Registration, login, and session endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use super::types::{
    LoginRequest, LogoutRequest, MessageResponse, OauthRequest, OauthResponse, RefreshRequest,
    RegisterRequest, SessionResponse,
};
use super::{
    access_token_required, error_response, extract_bearer_token, missing_payload, normalize_email,
    valid_email, valid_name, valid_password, validation_error,
};
use crate::auth::AuthEngine;

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, session started", body = SessionResponse),
        (status = 409, description = "Email already exists", body = MessageResponse),
        (status = 422, description = "Validation error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if !valid_name(request.name.trim()) {
        return validation_error("Name length must be from 1 to 100 characters");
    }
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return validation_error("Email is invalid");
    }
    if !valid_password(&request.password) {
        return validation_error("Password length must be from 6 to 50 characters");
    }
    if request.password != request.confirm_password {
        return validation_error("Passwords do not match");
    }

    match engine
        .register(request.name.trim(), &email, &request.password)
        .await
    {
        Ok(tokens) => Json(SessionResponse {
            message: "Register success".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session started", body = SessionResponse),
        (status = 401, description = "Email or password is incorrect", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return validation_error("Email is invalid");
    }

    match engine.login(&email, &request.password).await {
        Ok(tokens) => Json(SessionResponse {
            message: "Login success".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

/// Exchange a provider authorization code for a session. Unknown addresses
/// are registered on the fly.
#[utoipa::path(
    post,
    path = "/v1/auth/oauth/google",
    request_body = OauthRequest,
    responses(
        (status = 200, description = "Session started", body = OauthResponse),
        (status = 403, description = "Google email not verified", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn oauth_google(
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<OauthRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let code = request.code.trim();
    if code.is_empty() {
        return validation_error("Code is required");
    }

    match engine.oauth_login(code).await {
        Ok(login) => Json(OauthResponse {
            message: "Login success".to_string(),
            access_token: login.tokens.access_token,
            refresh_token: login.tokens.refresh_token,
            new_user: login.new_user,
            verify: login.verify,
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session rotated", body = SessionResponse),
        (status = 401, description = "Used refresh token or not exist", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if request.refresh_token.trim().is_empty() {
        return validation_error("Refresh token is required");
    }

    match engine.refresh(request.refresh_token.trim()).await {
        Ok(tokens) => Json(SessionResponse {
            message: "Refresh token successfully".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

/// Revoke the presented refresh token. The caller must hold a valid access
/// token; revoking an already consumed refresh token still succeeds.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Refresh token revoked", body = MessageResponse),
        (status = 401, description = "Access token is required", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
    payload: Option<Json<LogoutRequest>>,
) -> impl IntoResponse {
    let Some(access_token) = extract_bearer_token(&headers) else {
        return access_token_required();
    };
    if let Err(err) = engine.authenticate(&access_token) {
        return error_response(&err);
    }

    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match engine.logout(request.refresh_token.trim()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Logout success")),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}
