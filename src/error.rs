use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repository::RepositoryError;

/// ApiError
///
/// The request-level error taxonomy. Every failure a handler or guard can
/// produce maps to exactly one variant, and every variant maps to exactly one
/// HTTP outcome in `IntoResponse`. All errors are handled per-request; none
/// are retried and none are fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Registration referenced a role id that does not exist.
    #[error("role {0} does not exist")]
    RoleNotFound(i64),

    /// Registration collided with an existing login. Detected via the
    /// database unique-violation, not an application-level pre-check.
    #[error("login is already taken")]
    DuplicateLogin,

    /// Login failed. Unknown login and wrong password are deliberately
    /// indistinguishable to the client.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// The session is valid but the user does not hold the required role.
    #[error("role '{0}' required")]
    RoleRequired(&'static str),

    /// No live session accompanies the request. Surfaced as a redirect to
    /// the login page rather than an error body, as a navigation hint for
    /// browser clients.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Password hashing failed.
    #[error("password hashing failure")]
    Hash(#[from] bcrypt::BcryptError),

    /// Any persistence failure.
    #[error("storage failure")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate => ApiError::DuplicateLogin,
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotAuthenticated => {
                return Redirect::to("/login").into_response();
            }
            ApiError::RoleNotFound(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateLogin => StatusCode::CONFLICT,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::RoleRequired(_) => StatusCode::FORBIDDEN,
            ApiError::Hash(err) => {
                // Log the underlying failure, respond with a generic body.
                tracing::error!("password hashing failed: {err:?}");
                return generic_server_error();
            }
            ApiError::Storage(err) => {
                tracing::error!("storage failure: {err:?}");
                return generic_server_error();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// The 500 response never carries detail about the underlying failure; the
/// detail lives in the logs only.
fn generic_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}
