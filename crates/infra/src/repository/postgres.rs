//! Postgres-backed product repository.
//!
//! Layout (provisioned externally, see `migrations/0001_create_catalog.sql`):
//!
//! - `products(id, name UNIQUE, sku, price, created_at)`
//! - `categories(id, name UNIQUE)`, created lazily on first reference, never deleted
//! - `product_categories(product_id, category_id)`, the many-to-many association
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError | Scenario |
//! |------------|----------------------|-----------------|----------|
//! | Database (unique violation) on `products` | `23505` | `AlreadyExists` | Another product already uses the name |
//! | Database (other) | Any other | `Storage` | Constraint, type or server errors |
//! | PoolClosed / PoolTimedOut / Io / Tls | N/A | `Storage` | Connection failures |
//!
//! The surrogate `products.id` never leaves this module; callers only see names.

use std::collections::BTreeSet;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument, warn};

use async_trait::async_trait;
use catalog_products::Product;

use super::{ProductRepository, RepositoryError};
use crate::metrics::RepositoryMetrics;

/// Postgres-backed product repository.
///
/// ## Transactions
///
/// `add` runs as one transaction: insert the product row, then per distinct
/// category (in sorted order) an idempotent upsert of the category row plus the
/// association row. Any failure rolls the whole transaction back once and is
/// surfaced; there is no retry.
///
/// ## Reads
///
/// `find_all`/`find_one` load product rows, then one categories query per row.
/// `get_metrics` issues three independent aggregate queries outside any shared
/// transaction, so the result is a best-effort snapshot.
#[derive(Debug, Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    /// Create a new repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_categories(&self, product_id: i64) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.name
            FROM categories c
            INNER JOIN product_categories pc ON c.id = pc.category_id
            WHERE pc.product_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_categories", e))
    }

    async fn hydrate(&self, row: ProductRow) -> Result<Product, RepositoryError> {
        let categories = self.load_categories(row.id).await?;
        Product::restore(row.name.clone(), row.sku, categories, row.price).map_err(|e| {
            RepositoryError::Storage(format!("stored product '{}' is invalid: {e}", row.name))
        })
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    #[instrument(
        skip(self, product),
        fields(name = %product.name(), categories = product.categories().len()),
        err
    )]
    async fn add(&self, product: Product) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if let Err(err) = insert_product(&mut tx, &product).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            return Err(err);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        debug!("product committed");
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, sku, price
            FROM products
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_all", e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let row = ProductRow::from_row(&row).map_err(|e| map_sqlx_error("decode_product", e))?;
            products.push(self.hydrate(row).await?);
        }
        Ok(products)
    }

    #[instrument(skip(self), err)]
    async fn find_one(&self, name: &str) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, sku, price
            FROM products
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_one", e))?
        .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;

        let row = ProductRow::from_row(&row).map_err(|e| map_sqlx_error("decode_product", e))?;
        self.hydrate(row).await
    }

    #[instrument(skip(self), err)]
    async fn get_metrics(&self) -> Result<RepositoryMetrics, RepositoryError> {
        let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let totals = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(price), 0)::BIGINT AS total_value,
                COALESCE(AVG(price), 0)::DOUBLE PRECISION AS average_price
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sum_prices", e))?;

        let total_value: i64 = totals
            .try_get("total_value")
            .map_err(|e| map_sqlx_error("decode_total_value", e))?;
        let average_price: f64 = totals
            .try_get("average_price")
            .map_err(|e| map_sqlx_error("decode_average_price", e))?;

        let category_rows = sqlx::query(
            r#"
            SELECT c.name, COUNT(DISTINCT pc.product_id) AS product_count
            FROM categories c
            INNER JOIN product_categories pc ON c.id = pc.category_id
            GROUP BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_by_category", e))?;

        let mut metrics = RepositoryMetrics {
            total_products: total_products.max(0) as u64,
            total_value,
            average_price,
            ..RepositoryMetrics::default()
        };
        for row in category_rows {
            let name: String = row.try_get("name").map_err(|e| map_sqlx_error("decode_category", e))?;
            let count: i64 = row
                .try_get("product_count")
                .map_err(|e| map_sqlx_error("decode_category", e))?;
            metrics.products_by_category.insert(name, count.max(0) as u64);
        }

        Ok(metrics)
    }
}

/// Insert the product row and its category links inside `tx`.
async fn insert_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &Product,
) -> Result<(), RepositoryError> {
    let product_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO products (name, sku, price)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(product.name())
    .bind(product.sku())
    .bind(product.price())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RepositoryError::AlreadyExists(product.name().to_string())
        } else {
            map_sqlx_error("insert_product", e)
        }
    })?;

    // Upsert in one global order so concurrent adds never wait on each other's
    // category row locks in opposite directions (40P01).
    let categories: BTreeSet<&str> = product.categories().iter().map(String::as_str).collect();

    for category in categories {
        // Upsert keyed by name; the no-op update makes RETURNING yield the existing id.
        let category_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(category)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_category", e))?;

        sqlx::query(
            r#"
            INSERT INTO product_categories (product_id, category_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("link_category", e))?;
    }

    Ok(())
}

/// Map SQLx errors to RepositoryError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => RepositoryError::Storage(format!(
            "database error in {}: {} (code {})",
            operation,
            db_err.message(),
            db_err.code().as_deref().unwrap_or("none")
        )),
        sqlx::Error::PoolClosed => {
            RepositoryError::Storage(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            RepositoryError::Storage(format!("timed out acquiring connection in {}", operation))
        }
        _ => RepositoryError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    sku: i64,
    price: i64,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            price: row.try_get("price")?,
        })
    }
}
