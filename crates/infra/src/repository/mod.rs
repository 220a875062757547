//! Product repository boundary.
//!
//! `ProductRepository` is the capability interface the HTTP layer (and anything
//! else) talks to. Two variants implement it identically:
//!
//! - [`InMemoryProductRepository`]: name-keyed map behind a reader/writer lock
//! - [`PostgresProductRepository`]: relational store via SQLx (one transaction per `add`)
//!
//! The variant is picked once at startup; callers never branch on it.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_products::Product;

use crate::metrics::RepositoryMetrics;

pub use in_memory::InMemoryProductRepository;
pub use postgres::PostgresProductRepository;

/// Repository operation error.
///
/// Validation failures never show up here; a `Product` is valid by construction.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A product with the same name is already stored.
    #[error("product already exists: {0}")]
    AlreadyExists(String),

    /// No product with the requested name exists.
    #[error("product not found: {0}")]
    NotFound(String),

    /// Underlying transaction or connection failure. Nothing may be assumed
    /// persisted when this is returned from `add`.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl RepositoryError {
    /// Stable, machine-readable identifier of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            RepositoryError::AlreadyExists(_) => "already_exists",
            RepositoryError::NotFound(_) => "not_found",
            RepositoryError::Storage(_) => "storage_failure",
        }
    }
}

/// Persistence for catalog products, keyed by product name.
///
/// ## Contract
///
/// - `add` fails with `AlreadyExists` on a name collision; the existence check and
///   the write are one critical section (or one transaction)
/// - `find_all` returns every product (unordered in memory, newest first in Postgres)
/// - `find_one` fails with `NotFound` for unknown names
/// - `get_metrics` recomputes aggregates from current contents on every call
///
/// Storage failures are propagated as `RepositoryError::Storage` from every
/// operation; callers that prefer a degraded (empty/zero) answer decide so
/// themselves.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn add(&self, product: Product) -> Result<(), RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_one(&self, name: &str) -> Result<Product, RepositoryError>;

    async fn get_metrics(&self) -> Result<RepositoryMetrics, RepositoryError>;
}

#[async_trait]
impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    async fn add(&self, product: Product) -> Result<(), RepositoryError> {
        (**self).add(product).await
    }

    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        (**self).find_all().await
    }

    async fn find_one(&self, name: &str) -> Result<Product, RepositoryError> {
        (**self).find_one(name).await
    }

    async fn get_metrics(&self) -> Result<RepositoryMetrics, RepositoryError> {
        (**self).get_metrics().await
    }
}
