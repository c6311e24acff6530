//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::directory::UserProfile;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email; the server tries both.
    pub username_or_email: Option<String>,
    pub password: Option<String>,
}

/// Refresh token in the body, for clients that do not use cookies.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Login payload: profile plus both token strings. The same tokens also
/// travel as cookies for browser clients.
#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh payload: rotated token pair only.
#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn login_request_accepts_missing_fields() -> Result<()> {
        let request: LoginRequest = serde_json::from_str("{}")?;
        assert!(request.username_or_email.is_none());
        assert!(request.password.is_none());
        Ok(())
    }

    #[test]
    fn login_request_uses_camel_case() -> Result<()> {
        let request: LoginRequest =
            serde_json::from_str(r#"{"usernameOrEmail": "alice", "password": "secret"}"#)?;
        assert_eq!(request.username_or_email.as_deref(), Some("alice"));
        Ok(())
    }

    #[test]
    fn refresh_request_round_trips() -> Result<()> {
        let request: RefreshRequest = serde_json::from_str(r#"{"refreshToken": "token"}"#)?;
        assert_eq!(request.refresh_token.as_deref(), Some("token"));
        Ok(())
    }

    #[test]
    fn session_data_serializes_camel_case() -> Result<()> {
        let data = SessionData {
            user: UserProfile {
                id: uuid::Uuid::nil(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                full_name: "Alice Example".to_string(),
            },
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let value = serde_json::to_value(&data)?;
        assert_eq!(value["accessToken"], "a");
        assert_eq!(value["refreshToken"], "r");
        assert_eq!(value["user"]["fullName"], "Alice Example");
        Ok(())
    }
}
