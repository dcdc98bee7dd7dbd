// ============================
// portfolio-backend-lib/src/auth/session.rs
// ============================
//! Server-side sessions keyed by an opaque cookie token.
use metrics::{counter, gauge};
use portfolio_common::Role;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::metrics::{SESSION_ACTIVE, SESSION_CREATED, SESSION_EXPIRED};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "portfolio_session";

/// How often expired sessions are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 10);

/// Session contents
///
/// `email` holds the encrypted address, never the plaintext. An anonymous
/// session may carry nothing but `failed_attempts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub failed_attempts: u32,
}

impl Session {
    /// A freshly logged-in session
    pub fn authenticated(encrypted_email: String, name: String, role: Role) -> Self {
        Self {
            email: Some(encrypted_email),
            name: Some(name),
            role: Some(role),
            failed_attempts: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.email.is_some()
    }

    /// Display name, as the chat and page views show it
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Clone)]
struct Entry {
    session: Session,
    expires_at: SystemTime,
}

/// Session manager for handling session tokens
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// When called inside a Tokio runtime a background task sweeps expired
    /// sessions periodically.
    pub fn new(ttl: Duration) -> Self {
        let manager = SessionManager {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            let manager_clone = manager.clone();
            tokio::spawn(async move {
                manager_clone.cleanup_task().await;
            });
        }

        manager
    }

    /// Store a new session and return its token
    pub async fn create(&self, session: Session) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            Entry {
                session,
                expires_at: SystemTime::now() + self.ttl,
            },
        );

        counter!(SESSION_CREATED).increment(1);
        gauge!(SESSION_ACTIVE).set(sessions.len() as f64);

        token
    }

    /// Get a live session by token
    pub async fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|entry| SystemTime::now() < entry.expires_at)
            .map(|entry| entry.session.clone())
    }

    /// Replace the contents of an existing session and refresh its expiry.
    ///
    /// Returns `false` when the token is unknown.
    pub async fn replace(&self, token: &str, session: Session) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(token) {
            Some(entry) => {
                entry.session = session;
                entry.expires_at = SystemTime::now() + self.ttl;
                true
            },
            None => false,
        }
    }

    /// Store `session` under `token` if that token is live, otherwise under a new token
    pub async fn save(&self, token: Option<&str>, session: Session) -> String {
        if let Some(token) = token {
            if self.get(token).await.is_some() && self.replace(token, session.clone()).await {
                return token.to_string();
            }
        }
        self.create(session).await
    }

    /// Drop a session
    pub async fn remove(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(token).map(|entry| entry.session);
        gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove expired sessions, returning how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = SystemTime::now();
        let before_count = sessions.len();

        sessions.retain(|_, entry| now < entry.expires_at);

        let removed = before_count - sessions.len();
        if removed > 0 {
            counter!(SESSION_EXPIRED).increment(removed as u64);
            gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
        }
        removed
    }

    /// Cleanup task that runs periodically to remove expired sessions
    async fn cleanup_task(&self) {
        loop {
            tokio::time::sleep(CLEANUP_INTERVAL).await;
            self.purge_expired().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_get_remove() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let token = manager
            .create(Session::authenticated("enc".into(), "Owner".into(), Role::Owner))
            .await;

        let session = manager.get(&token).await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.display_name(), "Owner");

        assert!(manager.remove(&token).await.is_some());
        assert!(manager.get(&token).await.is_none());
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn save_reuses_live_token() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let anon = Session {
            failed_attempts: 1,
            ..Session::default()
        };
        let token = manager.save(None, anon).await;

        let again = manager
            .save(
                Some(&token),
                Session {
                    failed_attempts: 2,
                    ..Session::default()
                },
            )
            .await;
        assert_eq!(again, token);
        assert_eq!(manager.get(&token).await.unwrap().failed_attempts, 2);

        let fresh = manager.save(Some("stale-token"), Session::default()).await;
        assert_ne!(fresh, "stale-token");
        assert_eq!(manager.len().await, 2);
    }

    #[tokio::test]
    async fn expired_sessions_are_hidden_and_purged() {
        let manager = SessionManager::new(Duration::ZERO);
        let token = manager.create(Session::default()).await;
        assert!(manager.get(&token).await.is_none());
        assert_eq!(manager.purge_expired().await, 1);
        assert!(manager.is_empty().await);
    }

    #[test]
    fn anonymous_session_has_placeholder_name() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert_eq!(session.display_name(), "Unknown");
    }
}
