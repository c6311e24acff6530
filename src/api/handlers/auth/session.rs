//! Session lifecycle endpoints: login, refresh, logout.
//!
//! Login verifies a credential and issues an access/refresh pair; refresh
//! exchanges a still-live refresh token for a rotated pair; logout revokes
//! the stored refresh reference. Rotation is single-use: a refresh token
//! that has been exchanged is permanently dead, even if it has not expired.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::middleware::CurrentUser;
use super::password::verify_password_blocking;
use super::state::AuthState;
use super::token::{IssuedToken, TokenKind};
use super::types::{LoginRequest, RefreshRequest, SessionData, TokenData};
use super::utils::hash_refresh_token;
use crate::api::response::{ApiError, ApiResponse};
use crate::directory::RotateOutcome;

pub(crate) const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub(crate) const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted; session cookies set"),
        (status = 400, description = "Missing username/email or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    // Reject before any directory lookup when no identifier was supplied.
    let needle = request
        .username_or_email
        .as_deref()
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .ok_or_else(|| ApiError::Validation("Username or email is required".to_string()))?
        .to_string();
    let password = request
        .password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ApiError::Validation("Password is required".to_string()))?;

    // Unknown user and wrong password take the same exit so callers cannot
    // tell which one happened.
    let user = auth_state
        .users()
        .find_by_username_or_email(&needle)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let (access, refresh) = issue_pair(&auth_state, user.id)?;
    auth_state
        .users()
        .store_refresh_token(user.id, hash_refresh_token(&refresh.token))
        .await?;

    let headers = session_cookies(&auth_state, &access.token, &refresh.token)?;
    let envelope = ApiResponse::new(
        StatusCode::OK,
        SessionData {
            user: user.profile(),
            access_token: access.token,
            refresh_token: refresh.token,
        },
        "Login successful",
    );
    Ok((headers, envelope).into_response())
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated; session cookies updated"),
        (status = 401, description = "Missing, invalid, expired, or superseded refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<Response, ApiError> {
    let body_token = payload.and_then(|Json(request)| request.refresh_token);
    let token = cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .or(body_token)
        .ok_or(ApiError::Unauthorized)?;

    let claims = auth_state
        .keys()
        .verify(&token, TokenKind::Refresh)
        .map_err(|err| {
            debug!("refresh token rejected: {err}");
            ApiError::Unauthorized
        })?;

    let user = auth_state
        .users()
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // A well-formed token is only live while it equals the stored reference;
    // a mismatch means it was already exchanged or revoked.
    let presented = hash_refresh_token(&token);
    let stored = user.refresh_token_hash.ok_or(ApiError::Unauthorized)?;
    if presented != stored {
        return Err(ApiError::Unauthorized);
    }

    let (access, refresh) = issue_pair(&auth_state, user.id)?;

    // Compare-and-set is the serialization point for concurrent refreshes:
    // whoever rotates first wins, everyone else is unauthorized.
    let outcome = auth_state
        .users()
        .rotate_refresh_token(user.id, &stored, hash_refresh_token(&refresh.token))
        .await?;
    if outcome == RotateOutcome::Stale {
        return Err(ApiError::Unauthorized);
    }

    let headers = session_cookies(&auth_state, &access.token, &refresh.token)?;
    let envelope = ApiResponse::new(
        StatusCode::OK,
        TokenData {
            access_token: access.token,
            refresh_token: refresh.token,
        },
        "Access token refreshed",
    );
    Ok((headers, envelope).into_response())
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Session revoked; cookies cleared"),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "auth"
)]
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    // Unconditional and idempotent: any authenticated caller may log out,
    // no matter the state of their refresh token.
    auth_state
        .users()
        .clear_refresh_token(user.profile.id)
        .await?;

    let headers = clear_session_cookies(&auth_state)?;
    let envelope = ApiResponse::new(StatusCode::OK, serde_json::json!({}), "Logged out");
    Ok((headers, envelope).into_response())
}

fn issue_pair(state: &AuthState, user_id: Uuid) -> Result<(IssuedToken, IssuedToken), ApiError> {
    // Signing failures are server-side faults, never auth failures.
    let access = state
        .keys()
        .issue(user_id, TokenKind::Access)
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
    let refresh = state
        .keys()
        .issue(user_id, TokenKind::Refresh)
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
    Ok((access, refresh))
}

/// Build `Set-Cookie` headers for a freshly issued token pair.
fn session_cookies(
    state: &AuthState,
    access_token: &str,
    refresh_token: &str,
) -> Result<HeaderMap, ApiError> {
    let config = state.config();
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        token_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token,
            config.access_token_ttl_seconds(),
            config.cookie_secure(),
        )
        .map_err(invalid_cookie)?,
    );
    headers.append(
        SET_COOKIE,
        token_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token,
            config.refresh_token_ttl_seconds(),
            config.cookie_secure(),
        )
        .map_err(invalid_cookie)?,
    );
    Ok(headers)
}

fn clear_session_cookies(state: &AuthState) -> Result<HeaderMap, ApiError> {
    let secure = state.config().cookie_secure();
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        token_cookie(ACCESS_TOKEN_COOKIE, "", 0, secure).map_err(invalid_cookie)?,
    );
    headers.append(
        SET_COOKIE,
        token_cookie(REFRESH_TOKEN_COOKIE, "", 0, secure).map_err(invalid_cookie)?,
    );
    Ok(headers)
}

fn token_cookie(
    name: &str,
    token: &str,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn invalid_cookie(err: InvalidHeaderValue) -> ApiError {
    ApiError::Internal(anyhow::Error::new(err).context("failed to build session cookie"))
}

/// Read a single cookie value from the `Cookie` header.
pub(super) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

/// Read a bearer token from the `Authorization` header.
pub(super) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookie_sets_flags() -> Result<(), InvalidHeaderValue> {
        let cookie = token_cookie(ACCESS_TOKEN_COOKIE, "token", 900, true)?;
        let cookie = cookie.to_str().expect("cookie is ascii");
        assert!(cookie.starts_with("accessToken=token;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(cookie.contains("Secure"));

        let cookie = token_cookie(REFRESH_TOKEN_COOKIE, "token", 900, false)?;
        let cookie = cookie.to_str().expect("cookie is ascii");
        assert!(!cookie.contains("Secure"));
        Ok(())
    }

    #[test]
    fn cookie_value_parses_multiple_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("a=1; accessToken=abc; refreshToken=def"),
        );
        assert_eq!(
            cookie_value(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc")
        );
        assert_eq!(
            cookie_value(&headers, REFRESH_TOKEN_COOKIE).as_deref(),
            Some("def")
        );
        assert!(cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn cookie_value_ignores_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("accessToken="));
        assert!(cookie_value(&headers, ACCESS_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }
}
