//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use super::handlers;
use crate::directory::UserProfile;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pordo",
        description = "Authentication and session service",
        license(name = "BSD-3-Clause")
    ),
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::auth::session::login,
        handlers::auth::session::refresh,
        handlers::auth::session::logout,
        handlers::me::me,
        handlers::me::change_password,
    ),
    components(schemas(
        UserProfile,
        handlers::auth::types::RegisterRequest,
        handlers::auth::types::LoginRequest,
        handlers::auth::types::RefreshRequest,
        handlers::auth::types::ChangePasswordRequest,
        handlers::auth::types::SessionData,
        handlers::auth::types::TokenData,
    )),
    tags(
        (name = "auth", description = "Login, refresh, logout, registration"),
        (name = "me", description = "Authenticated self-service"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

/// Return the OpenAPI specification for this service.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_all_routes() {
        let doc = openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/health",
            "/v1/auth/register",
            "/v1/auth/login",
            "/v1/auth/refresh",
            "/v1/auth/logout",
            "/v1/auth/password",
            "/v1/me",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }
}
