use serde::{Deserialize, Serialize};

use catalog_products::Product;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/v1/products`.
///
/// Absent fields decode to their zero value and are then rejected by product
/// validation, so a missing `name` reports `name_required` rather than a
/// decoding error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: i64,
    pub categories: Vec<String>,
    pub price: i64,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub name: String,
    pub sku: i64,
    pub categories: Vec<String>,
    pub price: i64,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name().to_string(),
            sku: product.sku(),
            categories: product.categories().to_vec(),
            price: product.price(),
        }
    }
}

pub fn products_to_response(products: &[Product]) -> Vec<ProductResponse> {
    products.iter().map(ProductResponse::from).collect()
}
