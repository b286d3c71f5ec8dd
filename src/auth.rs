use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    config::AppConfig,
    error::ApiError,
    session::{self, SessionState},
};

/// Role name required by the admin routes.
pub const ADMIN_ROLE: &str = "Admin";

/// AuthUser
///
/// The resolved identity of an authenticated request: the session snapshot
/// captured at login. `role` here is the *cached* role name, advisory only.
/// Authorization decisions that depend on the role re-read it from storage
/// (see `role_satisfied` and the admin middleware in lib.rs).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub login: String,
    pub role: String,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. This is the authenticated
/// guard: it resolves the session cookie against the injected session store.
///
/// The process:
/// 1. Dependency Resolution: session store and config from the app state.
/// 2. Cookie Extraction: the opaque token from the session cookie.
/// 3. Session Lookup: token -> identity snapshot (expired == unknown).
///
/// Rejection: `ApiError::NotAuthenticated`, which renders as a redirect to
/// the login page: a navigation hint for browser clients, not an error body.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the session store from the app state.
    SessionState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for the cookie name).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = session::parse_session_cookie(&parts.headers, &config.session_cookie)
            .ok_or(ApiError::NotAuthenticated)?;

        let data = sessions
            .get(&token)
            .await
            .ok_or(ApiError::NotAuthenticated)?;

        Ok(AuthUser {
            id: data.user_id,
            login: data.login,
            role: data.role,
        })
    }
}

/// role_satisfied
///
/// The role guard's allow/deny decision, kept independent of any middleware
/// signature. `fresh` is the role name read from storage at decision time
/// (`None` when the user row no longer exists); the session-cached role never
/// feeds this check.
pub fn role_satisfied(required: &str, fresh: Option<&str>) -> bool {
    fresh.is_some_and(|name| name == required)
}

// --- Password hashing ---

/// Hash a password using bcrypt.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Verify a password against a stored bcrypt digest.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}
