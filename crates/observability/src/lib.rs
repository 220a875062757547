//! Tracing, logging, metrics (shared setup).

/// Initialize process-wide tracing/logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Prometheus metric set.
pub mod metrics;

pub use metrics::{CatalogMetrics, InFlightGuard};
