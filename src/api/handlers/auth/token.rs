//! Access/refresh token issuance and verification.
//!
//! Both kinds are HS256 JWTs, but they are signed with independent secrets
//! and carry an explicit `kind` claim. Verification takes the expected kind
//! as a required parameter; it is never inferred from the token itself, so
//! one kind can never be replayed as the other.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use ulid::Ulid;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed token payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued for.
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id; makes every issued token distinct even for the same
    /// user within the same second.
    pub jti: String,
    pub kind: TokenKind,
}

/// Why a token failed verification. Callers log the specific reason but
/// respond with a generic `401`; none of these variants reach clients.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    BadSignature,
    #[error("unexpected token kind")]
    WrongKind,
    #[error("token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

pub struct IssuedToken {
    pub token: String,
    /// Expiry as unix seconds.
    pub expires_at: i64,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

/// Signing/verification keys for both token kinds.
pub struct TokenKeys {
    access: KindKeys,
    refresh: KindKeys,
}

impl TokenKeys {
    #[must_use]
    pub fn new(
        access_secret: &SecretString,
        access_ttl_seconds: i64,
        refresh_secret: &SecretString,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            access: KindKeys {
                encoding: EncodingKey::from_secret(access_secret.expose_secret().as_bytes()),
                decoding: DecodingKey::from_secret(access_secret.expose_secret().as_bytes()),
                ttl_seconds: access_ttl_seconds,
            },
            refresh: KindKeys {
                encoding: EncodingKey::from_secret(refresh_secret.expose_secret().as_bytes()),
                decoding: DecodingKey::from_secret(refresh_secret.expose_secret().as_bytes()),
                ttl_seconds: refresh_ttl_seconds,
            },
        }
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Mint a signed token of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if encoding fails; the caller surfaces
    /// this as an internal error, never as an auth failure.
    pub fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<IssuedToken, TokenError> {
        let keys = self.keys(kind);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + keys.ttl_seconds,
            jti: Ulid::new().to_string(),
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(TokenError::Signing)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Verify signature, expiry, and claim shape against the key for
    /// `expected` and return the decoded claims.
    ///
    /// # Errors
    ///
    /// Returns the specific failure reason; callers must collapse it to a
    /// generic unauthorized response before it reaches a client.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let keys = self.keys(expected);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data =
            decode::<Claims>(token, &keys.decoding, &validation).map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })?;

        if data.claims.kind != expected {
            return Err(TokenError::WrongKind);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(
            &SecretString::from("access-secret".to_string()),
            900,
            &SecretString::from("refresh-secret".to_string()),
            864_000,
        )
    }

    #[test]
    fn issue_and_verify_round_trip() -> Result<(), TokenError> {
        let keys = keys();
        let user_id = Uuid::new_v4();

        let issued = keys.issue(user_id, TokenKind::Access)?;
        let claims = keys.verify(&issued.token, TokenKind::Access)?;
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp, issued.expires_at);
        assert_eq!(claims.exp - claims.iat, 900);
        Ok(())
    }

    #[test]
    fn issued_tokens_are_unique() -> Result<(), TokenError> {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let first = keys.issue(user_id, TokenKind::Refresh)?;
        let second = keys.issue(user_id, TokenKind::Refresh)?;
        // Same user, same second: the jti claim still separates them.
        assert_ne!(first.token, second.token);
        Ok(())
    }

    #[test]
    fn kinds_do_not_cross_verify() -> Result<(), TokenError> {
        let keys = keys();
        let issued = keys.issue(Uuid::new_v4(), TokenKind::Access)?;
        // Wrong kind means the wrong key, which reads as a bad signature.
        let result = keys.verify(&issued.token, TokenKind::Refresh);
        assert!(matches!(result, Err(TokenError::BadSignature)));
        Ok(())
    }

    #[test]
    fn wrong_kind_claim_rejected_even_with_shared_secret() -> Result<(), TokenError> {
        let secret = SecretString::from("shared".to_string());
        let keys = TokenKeys::new(&secret, 900, &secret, 900);
        let issued = keys.issue(Uuid::new_v4(), TokenKind::Access)?;
        // Signature checks out, so the explicit kind claim must catch it.
        let result = keys.verify(&issued.token, TokenKind::Refresh);
        assert!(matches!(result, Err(TokenError::WrongKind)));
        Ok(())
    }

    #[test]
    fn expired_token_rejected() -> Result<(), TokenError> {
        let expired = TokenKeys::new(
            &SecretString::from("access-secret".to_string()),
            -60,
            &SecretString::from("refresh-secret".to_string()),
            -60,
        );
        let issued = expired.issue(Uuid::new_v4(), TokenKind::Access)?;

        let result = keys().verify(&issued.token, TokenKind::Access);
        assert!(matches!(result, Err(TokenError::Expired)));
        Ok(())
    }

    #[test]
    fn tampered_token_rejected() -> Result<(), TokenError> {
        let keys = keys();
        let issued = keys.issue(Uuid::new_v4(), TokenKind::Access)?;

        // Flip a character in the signature segment.
        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        let signature = parts[2].clone();
        let flipped = if signature.starts_with('A') { "B" } else { "A" };
        parts[2] = format!("{flipped}{}", &signature[1..]);
        let tampered = parts.join(".");

        let result = keys.verify(&tampered, TokenKind::Access);
        assert!(matches!(
            result,
            Err(TokenError::BadSignature | TokenError::Malformed)
        ));
        Ok(())
    }

    #[test]
    fn garbage_token_is_malformed() {
        let result = keys().verify("not-a-token", TokenKind::Access);
        assert!(matches!(result, Err(TokenError::Malformed)));
    }
}
