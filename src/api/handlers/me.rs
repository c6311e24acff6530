//! Authenticated self-service endpoints.
//!
//! Flow Overview:
//! 1) The auth middleware resolves the access token into a `CurrentUser`.
//! 2) Handlers here read that identity from request extensions.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::auth::middleware::CurrentUser;
use super::auth::password::{hash_password_blocking, verify_password_blocking};
use super::auth::types::ChangePasswordRequest;
use super::auth::AuthState;
use crate::api::response::{ApiError, ApiResponse};

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated user profile."),
        (status = 401, description = "Missing or invalid access token.")
    ),
    tag = "me"
)]
pub async fn me(Extension(user): Extension<CurrentUser>) -> Response {
    ApiResponse::new(StatusCode::OK, user.profile, "Current user").into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Missing fields or wrong old password"),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "me"
)]
pub async fn change_password(
    auth_state: Extension<Arc<AuthState>>,
    Extension(user): Extension<CurrentUser>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };
    if request.old_password.is_empty() || request.new_password.is_empty() {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }

    let record = auth_state
        .users()
        .find_by_id(user.profile.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Re-verify the old secret before accepting a new one.
    if !verify_password_blocking(request.old_password, record.password_hash.clone()).await? {
        return Err(ApiError::Validation("Invalid old password".to_string()));
    }

    let password_hash = hash_password_blocking(request.new_password).await?;
    auth_state
        .users()
        .update_password_hash(record.id, password_hash)
        .await?;

    // Deliberately no token rotation here: existing sessions stay valid
    // until natural expiry or refresh.
    let envelope = ApiResponse::new(StatusCode::OK, serde_json::json!({}), "Password changed");
    Ok(envelope.into_response())
}
