//! Service wiring: repository backend, event dispatcher, metrics.

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

use catalog_events::{Event, EventDispatcher};
use catalog_infra::{
    db, AppConfig, InMemoryProductRepository, PostgresProductRepository, ProductRepository,
    RepositoryError, StorageBackend,
};
use catalog_observability::CatalogMetrics;
use catalog_products::{Product, ProductCreated, PRODUCT_CREATED};

use crate::app::dto::CreateProductRequest;
use crate::app::errors::ApiError;

/// Everything the HTTP handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub repository: Arc<dyn ProductRepository>,
    pub dispatcher: Arc<EventDispatcher>,
    pub metrics: CatalogMetrics,
    pool: Option<PgPool>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("dispatcher", &self.dispatcher)
            .field("postgres", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl AppServices {
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        dispatcher: Arc<EventDispatcher>,
        metrics: CatalogMetrics,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            metrics,
            pool: None,
        }
    }

    /// In-memory backend with the default handlers registered.
    pub fn in_memory() -> anyhow::Result<Self> {
        let dispatcher = Arc::new(EventDispatcher::new());
        register_default_handlers(&dispatcher);

        Ok(Self::new(
            Arc::new(InMemoryProductRepository::new()),
            dispatcher,
            CatalogMetrics::new().context("failed to build metric registry")?,
        ))
    }

    /// Construct and persist a product, announce it, then refresh the catalog gauges.
    ///
    /// `product.created` is dispatched only once `add` has succeeded.
    pub async fn create_product(&self, request: CreateProductRequest) -> Result<Product, ApiError> {
        let (product, event) = Product::new(
            request.name,
            request.sku,
            request.categories,
            request.price,
            None,
        )?;

        self.repository.add(product.clone()).await?;
        self.dispatcher.dispatch(PRODUCT_CREATED, Arc::new(event.clone()));
        self.metrics.products_created.inc();
        info!(name = %product.name(), event_id = %event.event_id, "product created");

        self.refresh_catalog_metrics().await;
        Ok(product)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.repository.find_all().await
    }

    pub async fn get_product(&self, name: &str) -> Result<Product, RepositoryError> {
        self.repository.find_one(name).await
    }

    /// Recompute repository metrics and publish them as gauges. Failures are
    /// logged and leave the previous values in place.
    pub async fn refresh_catalog_metrics(&self) {
        match self.repository.get_metrics().await {
            Ok(snapshot) => self.metrics.set_catalog(
                snapshot.total_products,
                snapshot.total_value,
                snapshot.average_price,
                snapshot
                    .products_by_category
                    .iter()
                    .map(|(category, count)| (category.as_str(), *count)),
            ),
            Err(e) => warn!(error = %e, "failed to refresh catalog metrics"),
        }
    }

    /// Close the database pool, if any.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("database pool closed");
        }
    }
}

/// Build services for the configured storage backend.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match config.storage {
        StorageBackend::Memory => {
            info!("using in-memory product repository");
            AppServices::in_memory()
        }
        StorageBackend::Postgres => {
            let pool = db::connect(&config.database, &config.pool)
                .await
                .context("failed to connect to postgres")?;
            info!("using postgres product repository");

            let dispatcher = Arc::new(EventDispatcher::new());
            register_default_handlers(&dispatcher);

            let mut services = AppServices::new(
                Arc::new(PostgresProductRepository::new(pool.clone())),
                dispatcher,
                CatalogMetrics::new().context("failed to build metric registry")?,
            );
            services.pool = Some(pool);
            services.refresh_catalog_metrics().await;
            Ok(services)
        }
    }
}

/// Log every `product.created` event.
pub fn register_default_handlers(dispatcher: &EventDispatcher) {
    dispatcher.register(PRODUCT_CREATED, |event: Arc<dyn Event>| {
        let created = event
            .downcast_ref::<ProductCreated>()
            .ok_or_else(|| anyhow::anyhow!("unexpected payload for {}", event.event_kind()))?;

        info!(
            event_id = %created.event_id,
            name = %created.name,
            sku = created.sku,
            price = created.price,
            categories = created.categories.len(),
            occurred_at = %created.occurred_at,
            "product.created received"
        );
        Ok(())
    });
}
