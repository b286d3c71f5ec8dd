use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// SessionData
///
/// The authenticated-identity snapshot captured at login time and keyed by the
/// opaque session token. It is deliberately NOT re-fetched per request: a role
/// change after login does not alter this snapshot until re-login. The
/// authorization gate compensates by reading the role from storage at decision
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub login: String,
    // Role name resolved at login.
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// SessionStore Contract
///
/// Defines the abstract contract for session persistence: get/insert/destroy
/// by token. Handlers and extractors depend only on this trait, so the
/// in-process map used here can be swapped for any key-value store without
/// touching the calling code.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves a token to its live session, if any. Expired entries behave
    /// exactly like unknown tokens.
    async fn get(&self, token: &str) -> Option<SessionData>;

    /// Binds a freshly minted token to an identity snapshot.
    async fn insert(&self, token: String, data: SessionData);

    /// Removes the session for `token`. A no-op for unknown tokens, which
    /// makes logout idempotent.
    async fn destroy(&self, token: &str);
}

/// SessionState
///
/// The concrete type used to share the session store across the application
/// state.
pub type SessionState = Arc<dyn SessionStore>;

/// InMemorySessionStore
///
/// Process-held implementation over a concurrent map. Expiry is enforced
/// lazily: an entry older than the TTL is evicted on the next lookup.
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionData>,
    ttl_secs: i64,
}

impl InMemorySessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_secs,
        }
    }

    fn is_expired(&self, data: &SessionData) -> bool {
        Utc::now().signed_duration_since(data.created_at).num_seconds() >= self.ttl_secs
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, token: &str) -> Option<SessionData> {
        if let Some(entry) = self.sessions.get(token) {
            if !self.is_expired(entry.value()) {
                return Some(entry.value().clone());
            }
        } else {
            return None;
        }
        // Expired: drop the guard above before removing the entry.
        self.sessions.remove(token);
        None
    }

    async fn insert(&self, token: String, data: SessionData) {
        self.sessions.insert(token, data);
    }

    async fn destroy(&self, token: &str) {
        self.sessions.remove(token);
    }
}

/// mint_token
///
/// Produces a fresh opaque session token. UUID v4 gives 122 random bits,
/// rendered as 32 hex characters.
pub fn mint_token() -> String {
    Uuid::new_v4().simple().to_string()
}

// --- Cookie plumbing ---

/// Extracts the value of the named cookie from the request headers.
pub fn parse_session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

/// Builds the `Set-Cookie` value binding the session token to the client.
/// HttpOnly keeps the token away from page scripts.
pub fn session_cookie_header(name: &str, token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/",
        name, token
    ))
    .expect("session cookie header must be valid")
}

/// Builds the `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/",
        name
    ))
    .expect("session cookie header must be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(login: &str) -> SessionData {
        SessionData {
            user_id: 1,
            login: login.to_string(),
            role: "User".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_destroy() {
        let store = InMemorySessionStore::new(3600);
        let token = mint_token();

        store.insert(token.clone(), sample("alice")).await;
        let data = store.get(&token).await.expect("session should be live");
        assert_eq!(data.login, "alice");

        store.destroy(&token).await;
        assert!(store.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_destroy_unknown_token_is_noop() {
        let store = InMemorySessionStore::new(3600);
        store.destroy("no-such-token").await;
        assert!(store.get("no-such-token").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_behaves_as_unknown() {
        // TTL of zero expires entries immediately.
        let store = InMemorySessionStore::new(0);
        let token = mint_token();
        store.insert(token.clone(), sample("bob")).await;
        assert!(store.get(&token).await.is_none());
    }

    #[test]
    fn test_mint_token_is_opaque_and_unique() {
        let a = mint_token();
        let b = mint_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_session_cookie_picks_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("other=1; portal_session=abc123; theme=dark"),
        );
        assert_eq!(
            parse_session_cookie(&headers, "portal_session").as_deref(),
            Some("abc123")
        );
        assert!(parse_session_cookie(&headers, "missing").is_none());
    }

    #[test]
    fn test_clear_cookie_expires_in_the_past() {
        let value = clear_session_cookie("portal_session");
        let s = value.to_str().unwrap();
        assert!(s.contains("Expires=Thu, 01 Jan 1970"));
        assert!(s.starts_with("portal_session="));
    }
}
