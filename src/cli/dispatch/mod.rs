//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary will execute.

use anyhow::{Context, Result};
use secrecy::SecretString;

use crate::cli::actions::{server, Action};
use crate::cli::commands::auth;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Box::new(server::Args {
        port,
        dsn,
        access_token_secret: SecretString::from(auth_opts.access_token_secret),
        refresh_token_secret: SecretString::from(auth_opts.refresh_token_secret),
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        refresh_token_ttl_seconds: auth_opts.refresh_token_ttl_seconds,
        insecure_cookies: auth_opts.insecure_cookies,
        cors_origin: auth_opts.cors_origin,
    })))
}
