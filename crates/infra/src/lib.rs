//! Infrastructure layer: product persistence, database pool, configuration.

pub mod config;
pub mod db;
pub mod metrics;
pub mod repository;

pub use config::{AppConfig, ConfigError, ServerConfig, StorageBackend};
pub use db::{DatabaseConfig, PoolConfig};
pub use metrics::RepositoryMetrics;
pub use repository::{
    InMemoryProductRepository, PostgresProductRepository, ProductRepository, RepositoryError,
};
