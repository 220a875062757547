use axum::{routing::get, Router};

pub mod products;
pub mod system;

/// Router for every endpoint; handlers reach services through an `Extension`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .nest("/api/v1/products", products::router())
}
