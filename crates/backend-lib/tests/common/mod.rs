//! Shared setup for the integration tests
//!
//! Every test gets its own SQLite file in a temporary directory, bootstrapped
//! from the repository's `database/` schema and fixtures.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use backend_lib::{config::Settings, storage::Database, AppState};
use tempfile::TempDir;

/// The checked-in `create_tables/` and `initial_data/` tree
pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../database")
}

pub fn sqlite_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("portfolio.db").display())
}

pub fn test_settings(dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.data_dir = data_dir();
    settings.database.url = Some(sqlite_url(dir));
    settings
}

/// State over a fresh SQLite file, not yet bootstrapped
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn setup_state() -> (Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    let gateway = Database::from_settings(&settings.database).unwrap();
    let state = AppState::new(Arc::new(gateway), settings).unwrap();
    (Arc::new(state), dir)
}

/// State with schema, fixtures and seed accounts in place
pub async fn setup_test_env() -> (Arc<AppState>, TempDir) {
    let (state, dir) = setup_state();
    let report = state.bootstrap(true).await;
    assert!(report.is_clean(), "bootstrap failed: {:?}", report.failures);
    (state, dir)
}
