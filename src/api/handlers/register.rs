//! User registration.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::auth::password::hash_password_blocking;
use super::auth::types::RegisterRequest;
use super::auth::AuthState;
use crate::api::response::{ApiError, ApiResponse};
use crate::directory::{CreateOutcome, NewUser};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let username = request.username.trim().to_string();
    let full_name = request.full_name.trim().to_string();
    let email = super::auth::normalize_email(&request.email);

    if username.is_empty() || full_name.is_empty() || email.is_empty() || request.password.is_empty()
    {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }
    if !super::auth::valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".to_string()));
    }

    let password_hash = hash_password_blocking(request.password).await?;

    let outcome = auth_state
        .users()
        .create_user(NewUser {
            username,
            email,
            full_name,
            password_hash,
        })
        .await?;

    match outcome {
        CreateOutcome::Created(record) => {
            let envelope =
                ApiResponse::new(StatusCode::CREATED, record.profile(), "User registered");
            Ok(envelope.into_response())
        }
        CreateOutcome::Conflict => Err(ApiError::Conflict(
            "Username or email already exists".to_string(),
        )),
    }
}
