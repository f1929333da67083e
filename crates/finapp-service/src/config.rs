//! Service configuration.

#[cfg(feature = "rocksdb-backend")]
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "rocksdb-backend")]
use finapp_store::RocksConfig;
use finapp_store::{PostgresConfig, RetryPolicy, StoreConfig};

/// Errors turning the service configuration into a store configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `FINAPP_BACKEND` names no known backend.
    #[error("unknown backend {0:?} (expected \"rocksdb\" or \"postgres\")")]
    UnknownBackend(String),

    /// The selected backend was compiled out.
    #[error("backend {0:?} is not enabled in this build")]
    BackendDisabled(String),

    /// The PostgreSQL backend needs a connection URL.
    #[error("DATABASE_URL must be set for the postgres backend")]
    MissingDatabaseUrl,
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Storage backend, `rocksdb` or `postgres` (default: "rocksdb").
    pub backend: String,

    /// Path to `RocksDB` data directory (default: "/data/finapp").
    pub data_dir: String,

    /// PostgreSQL connection URL, required for the postgres backend.
    pub database_url: Option<String>,

    /// PostgreSQL pool size.
    pub database_max_connections: u32,

    /// Attempts per unit of work before a conflict aborts it.
    pub retry_max_attempts: u32,

    /// Wall-clock budget per unit of work in seconds.
    pub retry_deadline_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            backend: std::env::var("FINAPP_BACKEND")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(defaults.backend),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            database_url: std::env::var("DATABASE_URL").ok(),
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            retry_max_attempts: env_parse("RETRY_MAX_ATTEMPTS")
                .unwrap_or(defaults.retry_max_attempts),
            retry_deadline_seconds: env_parse("RETRY_DEADLINE_SECONDS")
                .unwrap_or(defaults.retry_deadline_seconds),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }

    /// Retry policy for the store, built from the retry settings.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            deadline: Some(Duration::from_secs(self.retry_deadline_seconds)),
            ..RetryPolicy::default()
        }
    }

    /// Store configuration for the selected backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unknown, compiled out, or missing
    /// its connection URL.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let config = match self.backend.as_str() {
            #[cfg(feature = "rocksdb-backend")]
            "rocksdb" => StoreConfig::RocksDb(RocksConfig::new(PathBuf::from(&self.data_dir))),
            #[cfg(not(feature = "rocksdb-backend"))]
            "rocksdb" => return Err(ConfigError::BackendDisabled(self.backend.clone())),
            "postgres" => {
                let url = self
                    .database_url
                    .clone()
                    .ok_or(ConfigError::MissingDatabaseUrl)?;
                let mut pg = PostgresConfig::new(url);
                pg.max_connections = self.database_max_connections;
                StoreConfig::Postgres(pg)
            }
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };
        Ok(config.with_retry(self.retry_policy()))
    }
}

/// Parse an environment variable, ignoring it when unset or malformed.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            backend: "rocksdb".into(),
            data_dir: "/data/finapp".into(),
            database_url: None,
            database_max_connections: finapp_store::config::DEFAULT_MAX_CONNECTIONS,
            retry_max_attempts: retry.max_attempts,
            retry_deadline_seconds: finapp_store::retry::DEFAULT_DEADLINE_SECS,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
