use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use catalog_core::Entity;
use catalog_products::Product;

use super::{ProductRepository, RepositoryError};
use crate::metrics::RepositoryMetrics;

/// In-memory product repository.
///
/// A name-keyed map behind one reader/writer lock. `add` holds the write lock
/// across the existence check and the insert; reads share the read lock, so a
/// reader never sees a half-applied `add`. No await point is reached while a
/// guard is held.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Storage("lock poisoned".to_string())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn add(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;

        match products.entry(product.id().to_owned()) {
            Entry::Occupied(existing) => Err(RepositoryError::AlreadyExists(existing.key().clone())),
            Entry::Vacant(slot) => {
                debug!(name = %slot.key(), "product stored");
                slot.insert(product);
                Ok(())
            }
        }
    }

    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        Ok(products.values().cloned().collect())
    }

    async fn find_one(&self, name: &str) -> Result<Product, RepositoryError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        products
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))
    }

    async fn get_metrics(&self) -> Result<RepositoryMetrics, RepositoryError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        RepositoryMetrics::from_products(products.values())
    }
}
