// ============================
// portfolio-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::ReversibleCipher;

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "portfolio.toml";

/// Prefix for environment overrides (`PORTFOLIO_DATABASE__HOST=...`)
pub const ENV_PREFIX: &str = "PORTFOLIO_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Directory holding `create_tables/` and `initial_data/`
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Drop every table before bootstrapping
    pub purge_on_start: bool,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// Database connection
    pub database: DatabaseSettings,
    /// Encryption overrides
    pub crypto: CryptoSettings,
    /// Accounts created after bootstrap
    pub seed_users: Vec<SeedUser>,
}

/// Database connection parameters
///
/// When `url` is set (normally from `DATABASE_URL`) it wins and its scheme
/// picks the dialect. Otherwise a MySQL URL is built from the local fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

/// Optional replacements for the built-in salt and key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryptoSettings {
    /// scrypt salt
    pub salt: Option<String>,
    /// base64url AES-256 key
    pub key: Option<String>,
}

/// An account created at start-up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    pub role: String,
    pub name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("database"),
            log_level: "info".to_string(),
            purge_on_start: true,
            session_ttl_secs: 60 * 60 * 24, // 1 day
            database: DatabaseSettings::default(),
            crypto: CryptoSettings::default(),
            seed_users: vec![
                SeedUser {
                    email: "owner@email.com".to_string(),
                    password: "password".to_string(),
                    role: "owner".to_string(),
                    name: "Owner".to_string(),
                },
                SeedUser {
                    email: "guest@email.com".to_string(),
                    password: "password".to_string(),
                    role: "guest".to_string(),
                    name: "Guest".to_string(),
                },
            ],
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "master".to_string(),
            password: "master".to_string(),
            name: "db".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Connection URL handed to the gateway
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => format!(
                "mysql://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

impl Settings {
    /// Layered figment: defaults, then the file, then env overrides
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "database.url".into()),
            )
    }

    /// Load from `portfolio.toml` (if any) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from an explicit file (if it exists) and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.session_ttl_secs == 0 {
            bail!("session_ttl_secs must be greater than zero");
        }
        if let Some(key) = &self.crypto.key {
            ReversibleCipher::new(key)?;
        }
        if let Some(salt) = &self.crypto.salt {
            if salt.is_empty() {
                bail!("crypto.salt must not be empty");
            }
        }
        Ok(())
    }
}
