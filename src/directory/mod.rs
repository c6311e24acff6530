//! User directory: the single source of truth for identities and the
//! per-user refresh-token reference.
//!
//! The directory is the serialization point for refresh-token rotation:
//! [`UserDirectory::rotate_refresh_token`] is compare-and-set on the stored
//! reference, so of two concurrent refreshes holding the same stale token,
//! exactly one can win.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

/// Full identity record, including secret fields. Never serialized.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// SHA-256 of the currently-live refresh token; `None` when revoked.
    pub refresh_token_hash: Option<Vec<u8>>,
}

impl UserRecord {
    /// Public view of the record, minus secret and refresh fields.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// What handlers are allowed to see and return to clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

/// Fields required to create a user. The password arrives pre-hashed; the
/// directory never sees a plaintext secret.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// Outcome when attempting to create a user.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(UserRecord),
    Conflict,
}

/// Outcome of a compare-and-set refresh-token rotation.
#[derive(Debug, PartialEq, Eq)]
pub enum RotateOutcome {
    Rotated,
    /// The stored reference no longer matches: the token was already
    /// exchanged or revoked.
    Stale,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by exact username or email match.
    async fn find_by_username_or_email(&self, needle: &str) -> Result<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    async fn create_user(&self, user: NewUser) -> Result<CreateOutcome>;

    /// Overwrite the stored refresh reference (login path). Any previously
    /// live refresh token is superseded.
    async fn store_refresh_token(&self, id: Uuid, hash: Vec<u8>) -> Result<()>;

    /// Replace the stored refresh reference only if it still equals
    /// `expected`. Must be atomic per identity.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &[u8],
        next: Vec<u8>,
    ) -> Result<RotateOutcome>;

    /// Clear the stored refresh reference. Idempotent.
    async fn clear_refresh_token(&self, id: Uuid) -> Result<()>;

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> Result<()>;
}
