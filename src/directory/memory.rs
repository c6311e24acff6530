//! In-memory user directory for tests and local development.
//!
//! Mirrors the Postgres semantics, including uniqueness conflicts and the
//! compare-and-set guarantee: all mutations happen under one lock, so a
//! rotation observes and replaces the stored reference atomically.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CreateOutcome, NewUser, RotateOutcome, UserDirectory, UserRecord};

#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_username_or_email(&self, needle: &str) -> Result<Option<UserRecord>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.username == needle || user.email == needle)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let users = self.users.lock().await;
        Ok(users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<CreateOutcome> {
        let mut users = self.users.lock().await;
        let taken = users
            .values()
            .any(|existing| existing.username == user.username || existing.email == user.email);
        if taken {
            return Ok(CreateOutcome::Conflict);
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            refresh_token_hash: None,
        };
        users.insert(record.id, record.clone());
        Ok(CreateOutcome::Created(record))
    }

    async fn store_refresh_token(&self, id: Uuid, hash: Vec<u8>) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.get_mut(&id) {
            user.refresh_token_hash = Some(hash);
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &[u8],
        next: Vec<u8>,
    ) -> Result<RotateOutcome> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(RotateOutcome::Stale);
        };
        match &user.refresh_token_hash {
            Some(current) if current.as_slice() == expected => {
                user.refresh_token_hash = Some(next);
                Ok(RotateOutcome::Rotated)
            }
            _ => Ok(RotateOutcome::Stale),
        }
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.get_mut(&id) {
            user.refresh_token_hash = None;
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.get_mut(&id) {
            user.password_hash = password_hash;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            full_name: name.to_string(),
            password_hash: "$argon2id$...".to_string(),
        }
    }

    #[tokio::test]
    async fn create_user_rejects_duplicates() -> Result<()> {
        let directory = MemoryDirectory::new();
        let outcome = directory.create_user(new_user("alice")).await?;
        assert!(matches!(outcome, CreateOutcome::Created(_)));

        let outcome = directory.create_user(new_user("alice")).await?;
        assert!(matches!(outcome, CreateOutcome::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn lookup_matches_username_and_email() -> Result<()> {
        let directory = MemoryDirectory::new();
        directory.create_user(new_user("alice")).await?;

        let by_username = directory.find_by_username_or_email("alice").await?;
        assert!(by_username.is_some());
        let by_email = directory
            .find_by_username_or_email("alice@example.com")
            .await?;
        assert!(by_email.is_some());
        let missing = directory.find_by_username_or_email("bob").await?;
        assert!(missing.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn rotation_is_compare_and_set() -> Result<()> {
        let directory = MemoryDirectory::new();
        let outcome = directory.create_user(new_user("alice")).await?;
        let CreateOutcome::Created(record) = outcome else {
            anyhow::bail!("expected created outcome");
        };

        directory.store_refresh_token(record.id, vec![1]).await?;

        // First exchange wins.
        let outcome = directory
            .rotate_refresh_token(record.id, &[1], vec![2])
            .await?;
        assert_eq!(outcome, RotateOutcome::Rotated);

        // Second exchange with the stale reference loses.
        let outcome = directory
            .rotate_refresh_token(record.id, &[1], vec![3])
            .await?;
        assert_eq!(outcome, RotateOutcome::Stale);

        let user = directory
            .find_by_id(record.id)
            .await?
            .context("user should exist")?;
        assert_eq!(user.refresh_token_hash, Some(vec![2]));
        Ok(())
    }

    #[tokio::test]
    async fn clear_refresh_token_is_idempotent() -> Result<()> {
        let directory = MemoryDirectory::new();
        let CreateOutcome::Created(record) = directory.create_user(new_user("alice")).await? else {
            anyhow::bail!("expected created outcome");
        };

        directory.store_refresh_token(record.id, vec![1]).await?;
        directory.clear_refresh_token(record.id).await?;
        directory.clear_refresh_token(record.id).await?;

        let user = directory
            .find_by_id(record.id)
            .await?
            .context("user should exist")?;
        assert!(user.refresh_token_hash.is_none());

        // A rotation against a revoked reference must fail.
        let outcome = directory
            .rotate_refresh_token(record.id, &[1], vec![2])
            .await?;
        assert_eq!(outcome, RotateOutcome::Stale);
        Ok(())
    }
}
