use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user with a live session, whatever
/// their role. Every handler here relies on the `AuthUser` extractor
/// middleware being layered above this module in lib.rs; a request without a
/// session never reaches these handlers; it is redirected to /login.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /profile
        // The profile view greeting the session's user.
        .route("/profile", get(handlers::get_profile))
        // GET /api/user-info
        // The session's identity snapshot as JSON. Served from the session,
        // not from storage. See the handler.
        .route("/api/user-info", get(handlers::get_user_info))
}
