//! Credential hashing and verification (Argon2id, PHC strings).
//!
//! Hashing and verification are CPU-bound by design, so the async wrappers
//! move them onto the blocking pool instead of the request reactor. Raw
//! passwords and hashes are never logged.

use anyhow::{Context, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Hash a plaintext password into an Argon2id PHC string.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("password hashing failed: {err}"))?;
    Ok(hash.to_string())
}

/// Constant-time check of a plaintext password against a stored PHC string.
/// An unparseable stored hash reads as a mismatch, not an error.
pub(crate) fn verify_password(password: &str, phc_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub(crate) async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")?
}

pub(crate) async fn verify_password_blocking(password: String, phc_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &phc_hash))
        .await
        .context("password verification task failed")
}
