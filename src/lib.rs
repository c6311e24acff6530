//! # Pordo (Authentication & Session Service)
//!
//! `pordo` is a small authentication authority: it verifies credentials,
//! mints signed access/refresh token pairs, and enforces request
//! authorization through an explicit middleware step.
//!
//! ## Session Model
//!
//! Sessions are carried by two independent JWTs:
//!
//! - **Access token:** short-lived, stateless, never persisted. It cannot be
//!   revoked before its natural expiry, which bounds the blast radius of a
//!   logout to one access-token lifetime.
//! - **Refresh token:** long-lived and single-use. The database stores a hash
//!   of the one currently-live refresh token per user; exchanging it rotates
//!   the pair and permanently invalidates the consumed token, even if it has
//!   not expired. Logout clears the stored reference unconditionally.
//!
//! Each token kind is signed with its own secret and carries an explicit
//! `kind` claim, so an access token can never be replayed as a refresh token
//! or vice versa.
//!
//! ## Failure Discipline
//!
//! Login failures for unknown users and wrong passwords are deliberately
//! indistinguishable to the caller. Token verification distinguishes
//! malformed, expired, and forged tokens internally but collapses all of
//! them to a generic `401` at the HTTP boundary.

pub mod api;
pub mod cli;
pub mod directory;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
