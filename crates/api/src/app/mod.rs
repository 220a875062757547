//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repository backend, event dispatcher, metrics
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let metrics = services.metrics.clone();

    routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                metrics,
                middleware::track_metrics,
            ))
            .layer(Extension(services)),
    )
}

pub use services::AppServices;
