//! Postgres-backed user directory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{CreateOutcome, NewUser, RotateOutcome, UserDirectory, UserRecord};

pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        password_hash: row.get("password_hash"),
        refresh_token_hash: row.get("refresh_token_hash"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn find_by_username_or_email(&self, needle: &str) -> Result<Option<UserRecord>> {
        let query = "SELECT id, username, email, full_name, password_hash, refresh_token_hash \
                     FROM users WHERE username = $1 OR email = $1 LIMIT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(needle)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by username or email")?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let query = "SELECT id, username, email, full_name, password_hash, refresh_token_hash \
                     FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by id")?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn create_user(&self, user: NewUser) -> Result<CreateOutcome> {
        let query = "INSERT INTO users (username, email, full_name, password_hash) \
                     VALUES ($1, $2, $3, $4) \
                     RETURNING id, username, email, full_name, password_hash, refresh_token_hash";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(CreateOutcome::Created(record_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn store_refresh_token(&self, id: Uuid, hash: Vec<u8>) -> Result<()> {
        let query = "UPDATE users SET refresh_token_hash = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to store refresh token reference")?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &[u8],
        next: Vec<u8>,
    ) -> Result<RotateOutcome> {
        // Single-statement compare-and-set: zero rows affected means the
        // reference changed under us and the presented token is dead.
        let query = "UPDATE users SET refresh_token_hash = $3, updated_at = NOW() \
                     WHERE id = $1 AND refresh_token_hash = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(expected)
            .bind(next)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to rotate refresh token reference")?;

        if result.rows_affected() == 0 {
            Ok(RotateOutcome::Stale)
        } else {
            Ok(RotateOutcome::Rotated)
        }
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<()> {
        // Logout is idempotent; clearing an already-clear reference is fine.
        let query = "UPDATE users SET refresh_token_hash = NULL, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to clear refresh token reference")?;
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> Result<()> {
        let query = "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password hash")?;
        Ok(())
    }
}
