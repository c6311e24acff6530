use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("access-token-secret")
                .long("access-token-secret")
                .help("Secret used to sign access tokens")
                .env("PORDO_ACCESS_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("refresh-token-secret")
                .long("refresh-token-secret")
                .help("Secret used to sign refresh tokens (independent of the access secret)")
                .env("PORDO_REFRESH_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("access-token-ttl-seconds")
                .long("access-token-ttl-seconds")
                .help("Access token lifetime in seconds")
                .env("PORDO_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-token-ttl-seconds")
                .long("refresh-token-ttl-seconds")
                .help("Refresh token lifetime in seconds")
                .env("PORDO_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("864000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("insecure-cookies")
                .long("insecure-cookies")
                .help("Drop the Secure cookie attribute (local development only)")
                .env("PORDO_INSECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cors-origin")
                .long("cors-origin")
                .help("Browser origin allowed to call the API with credentials")
                .env("PORDO_CORS_ORIGIN"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub insecure_cookies: bool,
    pub cors_origin: Option<String>,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required secret is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            access_token_secret: matches
                .get_one::<String>("access-token-secret")
                .cloned()
                .context("missing required argument: --access-token-secret")?,
            refresh_token_secret: matches
                .get_one::<String>("refresh-token-secret")
                .cloned()
                .context("missing required argument: --refresh-token-secret")?,
            access_token_ttl_seconds: matches
                .get_one::<i64>("access-token-ttl-seconds")
                .copied()
                .unwrap_or(900),
            refresh_token_ttl_seconds: matches
                .get_one::<i64>("refresh-token-ttl-seconds")
                .copied()
                .unwrap_or(864_000),
            insecure_cookies: matches.get_flag("insecure-cookies"),
            cors_origin: matches.get_one::<String>("cors-origin").cloned(),
        })
    }
}
