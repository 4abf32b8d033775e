//! Cookie-addressed session store
//!
//! One session id (carried by a cookie) maps to a flat key/value map.
//! Every guard writes its login under its own `login_<guard>` key, which
//! is what keeps admin areas logged in independently of each other.
//!
//! A successful login rotates the id: the entries move to a fresh id and
//! the response carries a [`RenewedSession`] extension so the session
//! middleware re-issues the cookie. An id presented before
//! authentication never names a logged-in session.

pub mod isolator;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Storage backend for session data.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn get(&self, session_id: &str, key: &str) -> Option<String>;
    async fn insert(&self, session_id: &str, key: &str, value: String);
    /// Remove a key, returning whether it was present.
    async fn remove(&self, session_id: &str, key: &str) -> bool;
    async fn destroy(&self, session_id: &str);
    /// Move every entry of a session to a new id, dropping the old id.
    async fn migrate(&self, old_id: &str, new_id: &str);
}

/// In-process session storage.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    sessions: Arc<RwLock<HashMap<String, HashMap<String, String>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn get(&self, session_id: &str, key: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).and_then(|data| data.get(key)).cloned()
    }

    async fn insert(&self, session_id: &str, key: &str, value: String) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    async fn remove(&self, session_id: &str, key: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions
            .get_mut(session_id)
            .map(|data| data.remove(key).is_some())
            .unwrap_or(false)
    }

    async fn destroy(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    async fn migrate(&self, old_id: &str, new_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(data) = sessions.remove(old_id) {
            sessions.insert(new_id.to_string(), data);
        }
    }
}

/// Response extension set by the login handler after rotating the
/// session id. The session middleware re-issues the cookie with it.
#[derive(Debug, Clone)]
pub struct RenewedSession(pub String);

/// Hands out per-request [`Session`] handles and owns the cookie name.
#[derive(Clone)]
pub struct SessionManager {
    backend: Arc<dyn SessionBackend>,
    cookie_name: String,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn SessionBackend>, cookie_name: impl Into<String>) -> Self {
        Self {
            backend,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn in_memory(cookie_name: impl Into<String>) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), cookie_name)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Open the session for a request. With no incoming id a fresh
    /// session is started and the response must set the cookie.
    pub fn open(&self, existing_id: Option<String>) -> Session {
        match existing_id {
            Some(id) => Session {
                id,
                fresh: false,
                backend: self.backend.clone(),
            },
            None => Session {
                id: Uuid::new_v4().to_string(),
                fresh: true,
                backend: self.backend.clone(),
            },
        }
    }

    // Direct store access, mainly for inspection from tests and tooling.

    pub async fn get(&self, session_id: &str, key: &str) -> Option<String> {
        self.backend.get(session_id, key).await
    }

    pub async fn insert(&self, session_id: &str, key: &str, value: String) {
        self.backend.insert(session_id, key, value).await
    }
}

/// Per-request session handle, placed in request extensions by the
/// `web` middleware step.
#[derive(Clone)]
pub struct Session {
    id: String,
    fresh: bool,
    backend: Arc<dyn SessionBackend>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this session was started by the current request.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.backend.get(&self.id, key).await
    }

    pub async fn insert(&self, key: &str, value: impl Into<String>) {
        self.backend.insert(&self.id, key, value.into()).await
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.backend.remove(&self.id, key).await
    }

    /// Swap in a fresh id, keeping the session's entries. The old id
    /// stops resolving to anything.
    pub async fn rotate(&mut self) {
        let new_id = Uuid::new_v4().to_string();
        self.backend.migrate(&self.id, &new_id).await;
        self.id = new_id;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("fresh", &self.fresh)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_round_trip() {
        let backend = MemoryBackend::new();
        backend.insert("s1", "login_admin", "u1".to_string()).await;

        assert_eq!(backend.get("s1", "login_admin").await.as_deref(), Some("u1"));
        assert_eq!(backend.get("s1", "login_merchant").await, None);
        assert_eq!(backend.get("s2", "login_admin").await, None);
    }

    #[tokio::test]
    async fn test_remove_reports_presence() {
        let backend = MemoryBackend::new();
        backend.insert("s1", "login_admin", "u1".to_string()).await;

        assert!(backend.remove("s1", "login_admin").await);
        assert!(!backend.remove("s1", "login_admin").await);
        assert!(!backend.remove("missing", "login_admin").await);
    }

    #[tokio::test]
    async fn test_destroy_drops_all_keys() {
        let backend = MemoryBackend::new();
        backend.insert("s1", "login_admin", "u1".to_string()).await;
        backend.insert("s1", "login_merchant", "u2".to_string()).await;

        backend.destroy("s1").await;
        assert_eq!(backend.get("s1", "login_admin").await, None);
        assert_eq!(backend.get("s1", "login_merchant").await, None);
    }

    #[tokio::test]
    async fn test_manager_opens_fresh_session_without_id() {
        let manager = SessionManager::in_memory("aduo_session");
        let session = manager.open(None);
        assert!(session.is_fresh());
        assert!(!session.id().is_empty());
    }

    #[tokio::test]
    async fn test_manager_reuses_existing_id() {
        let manager = SessionManager::in_memory("aduo_session");
        manager.insert("abc", "login_admin", "u1".to_string()).await;

        let session = manager.open(Some("abc".to_string()));
        assert!(!session.is_fresh());
        assert_eq!(session.get("login_admin").await.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_session_handles_share_the_backend() {
        let manager = SessionManager::in_memory("aduo_session");
        let session = manager.open(None);
        session.insert("login_admin", "u1").await;

        let reopened = manager.open(Some(session.id().to_string()));
        assert_eq!(reopened.get("login_admin").await.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_rotate_carries_entries_to_a_fresh_id() {
        let manager = SessionManager::in_memory("aduo_session");
        let mut session = manager.open(Some("fixed".to_string()));
        session.insert("login_admin", "u1").await;
        session.insert("login_merchant", "u2").await;

        session.rotate().await;

        assert_ne!(session.id(), "fixed");
        assert_eq!(session.get("login_admin").await.as_deref(), Some("u1"));
        assert_eq!(session.get("login_merchant").await.as_deref(), Some("u2"));
        assert_eq!(manager.get("fixed", "login_admin").await, None);
        assert_eq!(manager.get("fixed", "login_merchant").await, None);
    }

    #[tokio::test]
    async fn test_rotate_on_an_unknown_id_starts_empty() {
        let manager = SessionManager::in_memory("aduo_session");
        let mut session = manager.open(Some("never_written".to_string()));

        session.rotate().await;

        assert_ne!(session.id(), "never_written");
        assert_eq!(session.get("login_admin").await, None);
    }
}
