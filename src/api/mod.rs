//! Router wiring and server bootstrap.

use anyhow::{Context, Result};
use axum::{
    extract::{MatchedPath, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, info_span};
use ulid::Ulid;

use crate::directory::PgDirectory;

pub mod handlers;
mod openapi;
pub mod response;

pub use handlers::auth::{AuthConfig, AuthState};
pub use openapi::openapi;

/// Build the application router around shared auth state.
///
/// Protected routes sit behind an explicit authorization layer: the
/// middleware resolves the request to an identity (or a `401`) before any
/// handler runs.
#[must_use]
pub fn router(auth_state: Arc<AuthState>) -> Router {
    let protected = Router::new()
        .route("/v1/auth/logout", post(handlers::auth::session::logout))
        .route("/v1/auth/password", post(handlers::me::change_password))
        .route("/v1/me", get(handlers::me::me))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&auth_state),
            handlers::auth::middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/v1/auth/register", post(handlers::register::register))
        .route("/v1/auth/login", post(handlers::auth::session::login))
        .route("/v1/auth/refresh", post(handlers::auth::session::refresh))
        .merge(protected)
        .layer(Extension(auth_state))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map_or(request.uri().path(), MatchedPath::as_str);
                info_span!(
                    "http.request",
                    method = %request.method(),
                    path,
                    request_id = %Ulid::new(),
                )
            }),
        )
}

/// Connect to the database and serve the API.
///
/// # Errors
///
/// Returns an error if the database is unreachable, the listener cannot
/// bind, or the server fails while running.
pub async fn new(
    port: u16,
    dsn: String,
    auth_config: AuthConfig,
    cors_origin: Option<String>,
) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let auth_state = Arc::new(AuthState::new(
        auth_config,
        Arc::new(PgDirectory::new(pool)),
    ));

    let mut app = router(auth_state);

    if let Some(origin) = cors_origin {
        let origin =
            HeaderValue::from_str(&origin).context("invalid CORS origin")?;
        let cors = CorsLayer::new()
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_methods([Method::GET, Method::POST])
            .allow_origin(AllowOrigin::exact(origin))
            .allow_credentials(true);
        app = app.layer(cors);
    }

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!(port, "listening");

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
