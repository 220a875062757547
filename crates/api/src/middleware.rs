//! Golden-signal instrumentation: latency, traffic, errors, saturation.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use catalog_observability::CatalogMetrics;

/// Endpoint label for requests that matched no route.
pub const UNMATCHED_ENDPOINT: &str = "unknown";

/// Record one request in the HTTP metrics.
///
/// The endpoint label is the matched route template (`/api/v1/products/:name`),
/// never the raw path, so label cardinality stays bounded.
pub async fn track_metrics(
    State(metrics): State<CatalogMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let _in_flight = metrics.track_in_flight();
    let start = Instant::now();

    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());

    let response = next.run(req).await;

    metrics.observe_request(&method, &endpoint, response.status().as_u16(), start.elapsed());
    response
}
