use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{LoginRequest, RegisterRequest, Role, UserInfo},
    session::{self, SessionData},
};
use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{Html, Redirect},
};
use chrono::Utc;

// --- Handlers ---

/// home
///
/// [Public Route] The entry redirect: every visit to `/` lands on the login
/// page. (An earlier revision branched on the session here; the settled
/// behavior is the unconditional redirect.)
pub async fn home() -> Redirect {
    Redirect::to("/login")
}

/// register_user
///
/// [Public Route] Handles new user registration from the static form.
///
/// *Order of checks*: the role must exist (otherwise 400) before anything is
/// written. Login uniqueness is NOT pre-checked: the insert relies on the
/// unique index, and a violation surfaces as 409. On success the client is
/// redirected to the login page; no session is created by registration.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 303, description = "Registered, redirected to login"),
        (status = 400, description = "Role does not exist"),
        (status = 409, description = "Login already taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Form(payload): Form<RegisterRequest>,
) -> Result<Redirect, ApiError> {
    state
        .repo
        .get_role(payload.role_id)
        .await?
        .ok_or(ApiError::RoleNotFound(payload.role_id))?;

    let password_hash = auth::hash_password(&payload.password)?;

    let user = state
        .repo
        .create_user(&payload.login, &password_hash, payload.role_id)
        .await?;

    tracing::info!(user_id = user.id, login = %user.login, "user registered");
    Ok(Redirect::to("/login"))
}

/// login_user
///
/// [Public Route] Authenticates the submitted credentials and establishes a
/// session.
///
/// The user is fetched by login (joined with its role) and the password is
/// verified against the stored bcrypt digest. Unknown login and wrong
/// password both yield the same 401. On success a fresh opaque token is bound
/// to the identity snapshot `{id, login, role}` and delivered via the session
/// cookie, and the client is redirected to the profile view.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Session established, redirected to profile"),
        (status = 401, description = "Invalid login or password")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Form(payload): Form<LoginRequest>,
) -> Result<(HeaderMap, Redirect), ApiError> {
    let creds = state
        .repo
        .find_credentials(&payload.login)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password(&payload.password, &creds.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = session::mint_token();
    state
        .sessions
        .insert(
            token.clone(),
            SessionData {
                user_id: creds.id,
                login: creds.login.clone(),
                role: creds.role,
                created_at: Utc::now(),
            },
        )
        .await;

    tracing::info!(user_id = creds.id, login = %creds.login, "login succeeded");

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        session::session_cookie_header(&state.config.session_cookie, &token),
    );
    Ok((headers, Redirect::to("/profile")))
}

/// logout_user
///
/// [Public Route] Destroys the current session unconditionally (a missing or
/// unknown cookie is a no-op), clears the cookie and redirects to the login
/// page. Idempotent.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Session destroyed, redirected to login"))
)]
pub async fn logout_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (HeaderMap, Redirect) {
    if let Some(token) = session::parse_session_cookie(&headers, &state.config.session_cookie) {
        state.sessions.destroy(&token).await;
    }

    let mut out = HeaderMap::new();
    out.insert(
        SET_COOKIE,
        session::clear_session_cookie(&state.config.session_cookie),
    );
    (out, Redirect::to("/login"))
}

/// get_profile
///
/// [Authenticated Route] The profile view, greeting the user by login.
#[utoipa::path(
    get,
    path = "/profile",
    responses((status = 200, description = "Profile view"))
)]
pub async fn get_profile(AuthUser { login, .. }: AuthUser) -> Html<String> {
    Html(format!(
        "<h1>Welcome, {}!</h1><p><a href=\"/logout\">Log out</a></p>",
        escape_html(&login)
    ))
}

/// get_admin_panel
///
/// [Admin Route] The admin view. The role check happens in the admin
/// middleware layer in front of this router, against the role currently
/// recorded in storage.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin view"),
        (status = 403, description = "Authenticated but not an admin")
    )
)]
pub async fn get_admin_panel() -> Html<&'static str> {
    Html("<h1>Admin panel</h1><p>Visible to administrators only.</p>")
}

/// get_roles
///
/// [Public Route] Lists all roles as `{id, name}` pairs. Consumed by the
/// registration form to populate its role selector.
#[utoipa::path(
    get,
    path = "/api/roles",
    responses((status = 200, description = "All roles", body = [Role]))
)]
pub async fn get_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.repo.list_roles().await?))
}

/// get_user_info
///
/// [Authenticated Route] Returns the current session's identity snapshot.
/// Deliberately served from the session, not from storage: this endpoint
/// reports what the session was bound to at login time.
#[utoipa::path(
    get,
    path = "/api/user-info",
    responses((status = 200, description = "Session identity snapshot", body = UserInfo))
)]
pub async fn get_user_info(AuthUser { id, login, role }: AuthUser) -> Json<UserInfo> {
    Json(UserInfo { id, login, role })
}

/// get_users
///
/// [Admin Route] Lists every user with its role name.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users with role names", body = [UserInfo]),
        (status = 403, description = "Authenticated but not an admin")
    )
)]
pub async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<UserInfo>>, ApiError> {
    Ok(Json(state.repo.list_users().await?))
}

/// escape_html
///
/// Minimal entity escaping for user-supplied text rendered into the profile
/// view. Logins are arbitrary input and must not reach the page verbatim.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
