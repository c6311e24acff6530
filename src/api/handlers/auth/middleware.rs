//! Request authorization middleware.
//!
//! An explicit layer the router composes in front of protected routes: it
//! turns a request into an identity or a `401`, with no ambient side
//! effects. On success the resolved profile rides in request extensions;
//! on any failure the request is short-circuited before handler dispatch.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use super::session::{bearer_token, cookie_value, ACCESS_TOKEN_COOKIE};
use super::state::AuthState;
use super::token::TokenKind;
use crate::api::response::ApiError;
use crate::directory::UserProfile;

/// Identity attached to authenticated requests.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub profile: UserProfile,
}

/// Authenticate a request via the access-token cookie or a bearer header.
///
/// # Errors
///
/// Returns `401` when the token is missing, fails verification, or names a
/// user that no longer exists; `500` when the directory lookup fails.
pub async fn require_auth(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();
    let token = cookie_value(headers, ACCESS_TOKEN_COOKIE)
        .or_else(|| bearer_token(headers))
        .ok_or(ApiError::Unauthorized)?;

    let claims = auth_state
        .keys()
        .verify(&token, TokenKind::Access)
        .map_err(|err| {
            debug!("access token rejected: {err}");
            ApiError::Unauthorized
        })?;

    // Tokens can outlive their user; a dangling id is unauthorized, not 404.
    let user = auth_state
        .users()
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser {
        profile: user.profile(),
    });
    Ok(next.run(request).await)
}
