//! Auth handlers and supporting modules.
//!
//! The session model is a small state machine per identity:
//!
//! - **Anonymous** → **Authenticated** via login: credential verified, token
//!   pair issued, refresh reference persisted.
//! - **Authenticated** → **Authenticated** via refresh: single-use rotation
//!   guarded by a compare-and-set on the stored reference.
//! - **Authenticated** → **Revoked** via logout: reference cleared,
//!   idempotently. Outstanding access tokens stay valid until they expire;
//!   that bound is the access-token TTL.
//!
//! Access and refresh tokens use independent secrets, and the verifier
//! requires the expected kind as an explicit parameter.

pub mod middleware;
pub(crate) mod password;
pub(crate) mod session;
mod state;
pub mod token;
pub(crate) mod types;
mod utils;

pub use state::{AuthConfig, AuthState};
pub(crate) use utils::{normalize_email, valid_email};
