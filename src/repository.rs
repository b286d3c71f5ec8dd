use crate::models::{Credentials, Role, User, UserInfo};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

/// RepositoryError
///
/// Persistence failures as the rest of the application sees them. The only
/// case callers branch on is `Duplicate` (a unique-constraint violation,
/// i.e. a login collision); everything else is an opaque database failure
/// that surfaces as a generic server error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return RepositoryError::Duplicate;
            }
        }
        RepositoryError::Database(err)
    }
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the specific
/// implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Roles ---
    // Full role listing, used to populate the registration form.
    async fn list_roles(&self) -> Result<Vec<Role>, RepositoryError>;
    async fn get_role(&self, id: i64) -> Result<Option<Role>, RepositoryError>;

    // --- Users ---
    // Inserts a new user. Returns `RepositoryError::Duplicate` when the login
    // is already taken (unique index on users.login).
    async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
        role_id: i64,
    ) -> Result<User, RepositoryError>;

    // Login-time lookup: the user row joined with its role name.
    async fn find_credentials(&self, login: &str) -> Result<Option<Credentials>, RepositoryError>;

    // Fresh role fetch for the authorization gate. Reads the role name from
    // storage at decision time instead of trusting the session snapshot.
    async fn get_role_name(&self, user_id: i64) -> Result<Option<String>, RepositoryError>;

    // Admin listing: every user with its role name.
    async fn list_users(&self) -> Result<Vec<UserInfo>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_roles(&self) -> Result<Vec<Role>, RepositoryError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>, RepositoryError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// create_user
    ///
    /// The unique index on `users.login` is what rejects duplicates; there is
    /// no preceding SELECT, so concurrent registrations of the same login
    /// cannot race past each other.
    async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
        role_id: i64,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password_hash, role_id)
            VALUES ($1, $2, $3)
            RETURNING id, login, password_hash, role_id, created_at
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_credentials(&self, login: &str) -> Result<Option<Credentials>, RepositoryError> {
        let creds = sqlx::query_as::<_, Credentials>(
            r#"
            SELECT u.id, u.login, u.password_hash, r.name AS role
            FROM users u
            JOIN roles r ON u.role_id = r.id
            WHERE u.login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    /// get_role_name
    ///
    /// Returns the role name currently recorded in storage for the user, or
    /// `None` when the user row has disappeared since the session was minted.
    async fn get_role_name(&self, user_id: i64) -> Result<Option<String>, RepositoryError> {
        let name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM users u
            JOIN roles r ON u.role_id = r.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name)
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>, RepositoryError> {
        let users = sqlx::query_as::<_, UserInfo>(
            r#"
            SELECT u.id, u.login, r.name AS role
            FROM users u
            JOIN roles r ON u.role_id = r.id
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
