//! Configuration loading and representation.
//!
//! Everything comes from environment variables; absent or empty values take defaults,
//! malformed ones are rejected with the offending key.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::db::{DatabaseConfig, PoolConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Which repository variant the process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" | "in_memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pool: PoolConfig,
    pub server: ServerConfig,
    pub storage: StorageBackend,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(raw: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| raw(key).filter(|value| !value.is_empty());
        let defaults = AppConfig::default();
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            host: string("DB_HOST", &defaults.database.host),
            port: parsed(&lookup, "DB_PORT", defaults.database.port)?,
            user: string("DB_USER", &defaults.database.user),
            password: string("DB_PASSWORD", &defaults.database.password),
            database: string("DB_NAME", &defaults.database.database),
            ssl_mode: string("DB_SSLMODE", &defaults.database.ssl_mode),
        };

        let pool = PoolConfig {
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", defaults.pool.max_connections)?,
            max_idle_connections: parsed(
                &lookup,
                "DB_MAX_IDLE_CONNECTIONS",
                defaults.pool.max_idle_connections,
            )?,
            max_lifetime: Duration::from_secs(parsed(
                &lookup,
                "DB_CONN_MAX_LIFETIME_SECS",
                defaults.pool.max_lifetime.as_secs(),
            )?),
            ..defaults.pool
        };

        let server = ServerConfig {
            port: parsed(&lookup, "SERVER_PORT", defaults.server.port)?,
        };

        let storage = match lookup("STORAGE_BACKEND") {
            None => defaults.storage,
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "STORAGE_BACKEND".to_string(),
                value,
            })?,
        };

        Ok(AppConfig {
            database,
            pool,
            server,
            storage,
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
    }
}
