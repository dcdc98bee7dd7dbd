// ============================
// portfolio-backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the portfolio server.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod feedback;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod resume;
pub mod storage;
pub mod ws_router;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::{seed_accounts, AuthService, CryptoError, DefaultAuth, Encryptor, SessionManager};
use crate::chat::ChatRoom;
use crate::config::Settings;
use crate::storage::{initialize_schema, BootstrapReport, Gateway};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence gateway
    pub gateway: Arc<dyn Gateway>,
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// Hashing and reversible encryption
    pub encryptor: Encryptor,
    /// The shared chat room
    pub chat: Arc<ChatRoom>,
    /// Settings the process started with
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(gateway: Arc<dyn Gateway>, settings: Settings) -> Result<Self, CryptoError> {
        let encryptor = Encryptor::from_settings(&settings.crypto)?;
        let auth = Arc::new(DefaultAuth::new(gateway.clone(), encryptor.clone()));
        let sessions = Arc::new(SessionManager::new(Duration::from_secs(settings.session_ttl_secs)));

        Ok(Self {
            gateway,
            auth,
            sessions,
            encryptor,
            chat: Arc::new(ChatRoom::default()),
            settings: Arc::new(settings),
        })
    }

    /// Create the schema, load fixtures and make sure the seed accounts exist
    pub async fn bootstrap(&self, purge: bool) -> BootstrapReport {
        let report = initialize_schema(self.gateway.as_ref(), &self.settings.data_dir, purge).await;
        let accounts = seed_accounts(self.auth.as_ref(), &self.settings.seed_users).await;

        let rows: usize = report.seeded.iter().map(|(_, n)| n).sum();
        if report.is_clean() {
            info!(tables = report.created.len(), rows, accounts, "database ready");
        } else {
            warn!(
                tables = report.created.len(),
                rows,
                accounts,
                failures = report.failures.len(),
                "database ready with bootstrap failures"
            );
        }
        report
    }
}
