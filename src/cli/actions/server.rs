use anyhow::Result;
use secrecy::SecretString;

use crate::api::{self, AuthConfig};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub insecure_cookies: bool,
    pub cors_origin: Option<String>,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the server fails to start or stops with an error.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.access_token_secret, args.refresh_token_secret)
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_token_ttl_seconds(args.refresh_token_ttl_seconds)
        .with_cookie_secure(!args.insecure_cookies);

    api::new(args.port, args.dsn, auth_config, args.cors_origin).await
}
