use crate::{AppState, config::AppConfig, handlers};
use axum::{
    Router,
    routing::{get, get_service},
};
use std::path::Path;
use tower_http::services::ServeFile;

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. The login and register paths double up: GET serves the static
/// HTML form (the file server is the template collaborator), POST hits the
/// corresponding handler.
pub fn public_routes(config: &AppConfig) -> Router<AppState> {
    let static_dir = Path::new(&config.static_dir);

    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring checks.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Entry point: unconditionally redirects to the login page.
        .route("/", get(handlers::home))
        // GET /login serves the static form; POST /login authenticates.
        .route(
            "/login",
            get_service(ServeFile::new(static_dir.join("login.html")))
                .post(handlers::login_user),
        )
        // GET /register serves the static form; POST /register creates the user.
        .route(
            "/register",
            get_service(ServeFile::new(static_dir.join("register.html")))
                .post(handlers::register_user),
        )
        // GET /logout
        // Destroys the session (if any) and redirects to /login. Idempotent,
        // so it stays public: an anonymous logout is simply the redirect.
        .route("/logout", get(handlers::logout_user))
        // GET /api/roles
        // Role listing for the registration form's selector.
        .route("/api/roles", get(handlers::get_roles))
}
