use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// Represents a row of the `roles` table. Role names are unique and act as
/// authorization capability tokens ("Admin" grants access to the admin routes).
/// The role set is seeded once at migration time and is read-mostly afterward.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// User
///
/// Represents a row of the `users` table. This is an internal structure: it
/// carries the bcrypt password digest and is therefore never serialized into
/// a response body. API-facing projections use `UserInfo` instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    // Unique, enforced by the storage layer.
    pub login: String,
    pub password_hash: String,
    // FK to roles.id.
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Credentials
///
/// The joined record resolved during login: the user row plus its role name.
/// Fetched in a single query (users joined with roles) so the session snapshot
/// can be built without a second roundtrip.
#[derive(Debug, Clone, FromRow, Default)]
pub struct Credentials {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub role: String,
}

/// UserInfo
///
/// The public identity projection `{id, login, role}` returned by the JSON
/// API. The `role` field is the role *name*, resolved via the join with the
/// `roles` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserInfo {
    pub id: i64,
    pub login: String,
    pub role: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /register),
/// submitted as an urlencoded form by the static registration page.
/// The password is hashed before it reaches the repository; the plaintext is
/// never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub role_id: i64,
}

/// LoginRequest
///
/// Input payload for POST /login, submitted by the static login form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}
