//! Postgres connection pool wiring.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::info;

/// Where and how to reach the catalog database.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// libpq-style mode: `disable`, `allow`, `prefer`, `require`, `verify-ca`, `verify-full`.
    pub ssl_mode: String,
}

impl DatabaseConfig {
    /// Build SQLx connect options. Fails only on an unknown `ssl_mode`.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        let ssl_mode: PgSslMode = self.ssl_mode.parse()?;
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(ssl_mode))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            ssl_mode: "disable".to_string(),
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Bounds for the connection pool.
///
/// SQLx has no "max idle" knob; `max_idle_connections` becomes the pool's
/// minimum size, and connections above it are reaped after `idle_timeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub max_idle_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 25,
            max_idle_connections: 5,
            max_lifetime: Duration::from_secs(5 * 60),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl PoolConfig {
    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.max_idle_connections.min(self.max_connections))
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
    }
}

/// Open the bounded pool and verify it answers `SELECT 1` before handing it out.
pub async fn connect(db: &DatabaseConfig, pool: &PoolConfig) -> Result<PgPool, sqlx::Error> {
    let options = db.connect_options()?;
    let pg_pool = pool.pool_options().connect_with(options).await?;

    sqlx::query("SELECT 1").execute(&pg_pool).await?;

    info!(
        host = %db.host,
        port = db.port,
        database = %db.database,
        max_connections = pool.max_connections,
        "database pool ready"
    );
    Ok(pg_pool)
}
