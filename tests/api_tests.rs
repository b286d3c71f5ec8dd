use async_trait::async_trait;
use auth_portal::{
    AppState, create_router,
    config::AppConfig,
    models::{Credentials, Role, User, UserInfo},
    repository::{Repository, RepositoryError, RepositoryState},
    session::{InMemorySessionStore, SessionState},
};
use chrono::Utc;
use reqwest::{StatusCode, redirect::Policy};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// --- In-memory repository backing the spawned server ---

struct InMemoryRepo {
    roles: Vec<Role>,
    users: Mutex<Vec<User>>,
}

const ADMIN_ROLE_ID: i64 = 1;
const USER_ROLE_ID: i64 = 2;

impl Default for InMemoryRepo {
    fn default() -> Self {
        InMemoryRepo {
            roles: vec![
                Role {
                    id: ADMIN_ROLE_ID,
                    name: "Admin".to_string(),
                },
                Role {
                    id: USER_ROLE_ID,
                    name: "User".to_string(),
                },
            ],
            users: Mutex::new(vec![]),
        }
    }
}

impl InMemoryRepo {
    fn role_name(&self, role_id: i64) -> Option<String> {
        self.roles
            .iter()
            .find(|r| r.id == role_id)
            .map(|r| r.name.clone())
    }

    // Direct storage mutation, standing in for an operator promoting a user.
    fn set_role(&self, login: &str, role_id: i64) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.login == login) {
            user.role_id = role_id;
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn list_roles(&self) -> Result<Vec<Role>, RepositoryError> {
        Ok(self.roles.clone())
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>, RepositoryError> {
        Ok(self.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
        role_id: i64,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.login == login) {
            return Err(RepositoryError::Duplicate);
        }
        let user = User {
            id: users.len() as i64 + 1,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            role_id,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_credentials(&self, login: &str) -> Result<Option<Credentials>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.login == login).map(|u| Credentials {
            id: u.id,
            login: u.login.clone(),
            password_hash: u.password_hash.clone(),
            role: self.role_name(u.role_id).unwrap_or_default(),
        }))
    }

    async fn get_role_name(&self, user_id: i64) -> Result<Option<String>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.id == user_id)
            .and_then(|u| self.role_name(u.role_id)))
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .map(|u| UserInfo {
                id: u.id,
                login: u.login.clone(),
                role: self.role_name(u.role_id).unwrap_or_default(),
            })
            .collect())
    }
}

// --- Test harness ---

struct TestApp {
    address: String,
    repo: Arc<InMemoryRepo>,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepo::default());
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        sessions: Arc::new(InMemorySessionStore::new(3600)) as SessionState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

/// A client with a cookie jar and redirects disabled, so each hop and each
/// Set-Cookie can be asserted on individually.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .cookie_store(true)
        .build()
        .unwrap()
}

async fn register(client: &reqwest::Client, address: &str, login: &str, role_id: i64) -> StatusCode {
    let role_id = role_id.to_string();
    client
        .post(format!("{address}/register"))
        .form(&[
            ("login", login),
            ("password", "p1"),
            ("role_id", role_id.as_str()),
        ])
        .send()
        .await
        .expect("register request failed")
        .status()
}

async fn login(client: &reqwest::Client, address: &str, login: &str, password: &str) -> StatusCode {
    client
        .post(format!("{address}/login"))
        .form(&[("login", login), ("password", password)])
        .send()
        .await
        .expect("login request failed")
        .status()
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_home_redirects_to_login() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/login");
}

#[tokio::test]
async fn test_login_form_is_served_statically() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/login", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("<form action=\"/login\" method=\"post\">"));
}

#[tokio::test]
async fn test_register_with_unknown_role_is_rejected() {
    let app = spawn_app().await;
    let status = register(&client(), &app.address, "alice", 99).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // No user row may have been created.
    assert!(app.repo.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_duplicate_login_conflicts() {
    let app = spawn_app().await;
    let c = client();

    assert_eq!(
        register(&c, &app.address, "alice", USER_ROLE_ID).await,
        StatusCode::SEE_OTHER
    );
    assert_eq!(
        register(&c, &app.address, "alice", USER_ROLE_ID).await,
        StatusCode::CONFLICT
    );
    assert_eq!(app.repo.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_login_with_bad_password_is_unauthorized() {
    let app = spawn_app().await;
    let c = client();
    register(&c, &app.address, "alice", USER_ROLE_ID).await;

    assert_eq!(
        login(&c, &app.address, "alice", "wrong").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_protected_routes_redirect_anonymous_clients() {
    let app = spawn_app().await;
    let c = client();

    for path in ["/profile", "/admin", "/api/user-info", "/api/users"] {
        let response = c
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "{path} should redirect anonymous clients"
        );
        assert_eq!(response.headers()["location"], "/login");
    }
}

#[tokio::test]
async fn test_roles_listing_is_public() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/api/roles", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let roles: Vec<Role> = response.json().await.unwrap();
    assert_eq!(roles.len(), 2);
}

#[tokio::test]
async fn test_full_session_lifecycle_with_promotion() {
    let app = spawn_app().await;
    let c = client();

    // Register and log in as a regular user.
    assert_eq!(
        register(&c, &app.address, "alice", USER_ROLE_ID).await,
        StatusCode::SEE_OTHER
    );
    assert_eq!(
        login(&c, &app.address, "alice", "p1").await,
        StatusCode::SEE_OTHER
    );

    // The session works: profile greets by login.
    let response = c
        .get(format!("{}/profile", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("alice"));

    // The snapshot reports the login-time role.
    let info: UserInfo = c
        .get(format!("{}/api/user-info", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info.role, "User");

    // Not an admin: 403, not a redirect.
    let response = c
        .get(format!("{}/admin", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Promote alice directly in storage. No re-login follows.
    app.repo.set_role("alice", ADMIN_ROLE_ID);

    // The role guard re-reads storage, so the SAME session now passes.
    let response = c
        .get(format!("{}/admin", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let users: Vec<UserInfo> = c
        .get(format!("{}/api/users", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, "Admin");

    // The cached snapshot is untouched by the promotion.
    let info: UserInfo = c
        .get(format!("{}/api/user-info", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info.role, "User");

    // Logout destroys the session; the old cookie is unauthenticated again.
    let response = c
        .get(format!("{}/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = c
        .get(format!("{}/profile", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/login");
}

#[tokio::test]
async fn test_admin_demotion_locks_out_live_session() {
    let app = spawn_app().await;
    let c = client();

    register(&c, &app.address, "root", ADMIN_ROLE_ID).await;
    login(&c, &app.address, "root", "p1").await;

    let response = c
        .get(format!("{}/admin", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Demote in storage: the fresh check locks the session out immediately,
    // even though its snapshot still says "Admin".
    app.repo.set_role("root", USER_ROLE_ID);

    let response = c
        .get(format!("{}/admin", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
