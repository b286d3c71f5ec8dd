/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level (via
/// Axum layers in lib.rs), preventing accidental exposure of protected
/// endpoints.

/// Routes accessible to all clients (forms, registration, login, logout,
/// role listing, health).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a live session.
pub mod authenticated;

/// Routes restricted to users whose *stored* role is 'Admin'.
/// The role is re-read from the database by the admin middleware.
pub mod admin;
