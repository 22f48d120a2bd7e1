// ============================================================================
// Marketplace Config - Centralized configuration management
// ============================================================================
//
// Loads configuration from environment variables (and an optional .env file)
// with sensible defaults.
//
// ============================================================================

mod constants;
mod database;
mod logging;
mod notifications;

// Re-export all public types
pub use constants::{MAX_REASON_LENGTH, MAX_REQUEST_BODY_SIZE};
pub use database::{DbConfig, StorageBackend};
pub use logging::{LogFormat, LoggingConfig};
pub use notifications::NotificationConfig;

use anyhow::Result;
use constants::*;

/// Main configuration structure for the marketplace server
#[derive(Clone, Debug)]
pub struct Config {
    /// Required when `storage_backend` is Postgres
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub port: u16,
    pub bind_address: String,
    pub rust_log: String,

    // Sub-configurations
    pub db: DbConfig,
    pub logging: LoggingConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let storage_backend = StorageBackend::from_env()?;
        let database_url = std::env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORAGE_BACKEND=postgres");
        }
        if storage_backend == StorageBackend::Memory {
            tracing::warn!(
                "STORAGE_BACKEND=memory: all state is process-local and lost on restart"
            );
        }

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            database_url,
            storage_backend,
            port,
            bind_address: format!("[::]:{}", port),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            db: DbConfig::from_env(),
            logging: LoggingConfig::from_env(),
            notifications: NotificationConfig::from_env(),
        })
    }
}
