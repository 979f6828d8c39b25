//! User profile endpoints.

use axum::{
    Json,
    extract::{Extension, Path},
    http::HeaderMap,
    response::IntoResponse,
};
use std::sync::Arc;

use super::types::{MessageResponse, ProfileResponse};
use super::{access_token_required, error_response, extract_bearer_token};
use crate::auth::AuthEngine;

#[utoipa::path(
    get,
    path = "/v1/users/me",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = ProfileResponse),
        (status = 401, description = "Access token is required", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn me(headers: HeaderMap, engine: Extension<Arc<AuthEngine>>) -> impl IntoResponse {
    let Some(access_token) = extract_bearer_token(&headers) else {
        return access_token_required();
    };
    let claims = match engine.authenticate(&access_token) {
        Ok(claims) => claims,
        Err(err) => return error_response(&err),
    };

    match engine.get_me(claims.user_id).await {
        Ok(profile) => Json(ProfileResponse {
            message: "Get my profile successfully".to_string(),
            result: profile.into(),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{username}",
    params(
        ("username" = String, Path, description = "Username to look up")
    ),
    responses(
        (status = 200, description = "Public profile", body = ProfileResponse),
        (status = 404, description = "User not found", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn profile(
    engine: Extension<Arc<AuthEngine>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    match engine.get_profile(username.trim()).await {
        Ok(profile) => Json(ProfileResponse {
            message: "Get profile successfully".to_string(),
            result: profile.into(),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}
