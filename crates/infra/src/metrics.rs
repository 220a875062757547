//! Catalog aggregates derived from repository contents.

use std::collections::{BTreeMap, BTreeSet};

use catalog_products::Product;

use crate::repository::RepositoryError;

/// Aggregate figures over all stored products.
///
/// Recomputed on every query; never stored. An empty repository yields
/// `{0, 0, 0.0, {}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryMetrics {
    pub total_products: u64,
    /// Sum of `price` over all products (smallest currency unit).
    pub total_value: i64,
    pub average_price: f64,
    /// Category name → number of products referencing it. A product listing the
    /// same category twice is counted once.
    pub products_by_category: BTreeMap<String, u64>,
}

impl RepositoryMetrics {
    /// Compute metrics from a snapshot of products.
    ///
    /// A price sum that does not fit in `i64` is a `Storage` failure, matching
    /// the relational backend's `bigint out of range`.
    pub fn from_products<'a>(
        products: impl IntoIterator<Item = &'a Product>,
    ) -> Result<Self, RepositoryError> {
        let mut metrics = Self::default();

        for product in products {
            metrics.total_products += 1;
            metrics.total_value = metrics
                .total_value
                .checked_add(product.price())
                .ok_or_else(|| RepositoryError::Storage("total product value overflows i64".to_string()))?;

            let distinct: BTreeSet<&str> = product.categories().iter().map(String::as_str).collect();
            for category in distinct {
                *metrics
                    .products_by_category
                    .entry(category.to_string())
                    .or_insert(0) += 1;
            }
        }

        metrics.average_price = average_price(metrics.total_value, metrics.total_products);
        Ok(metrics)
    }
}

/// `total_value / total`, or `0.0` for an empty catalog.
pub fn average_price(total_value: i64, total_products: u64) -> f64 {
    if total_products == 0 {
        0.0
    } else {
        total_value as f64 / total_products as f64
    }
}
