use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users whose role, as
/// currently recorded in the database, is 'Admin'. The admin middleware
/// layered above this module re-fetches the role per request: the
/// session-cached role is advisory, storage is authoritative. A user promoted
/// after login gains access here without re-login; a demoted user loses it
/// immediately.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // The admin panel view.
        .route("/admin", get(handlers::get_admin_panel))
        // GET /api/users
        // Every user with its role name.
        .route("/api/users", get(handlers::get_users))
}
