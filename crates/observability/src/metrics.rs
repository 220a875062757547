//! Prometheus metric set for the catalog service.
//!
//! ## Metric types
//! - **Counter**: products created, HTTP requests and errors
//! - **Histogram**: HTTP request latency
//! - **Gauge**: catalog size, total value, average price, per-category counts, in-flight requests
//!
//! Every metric lives in a registry owned by [`CatalogMetrics`]; nothing is
//! registered process-globally, so independent instances never collide.
//!
//! ```rust,ignore
//! let metrics = CatalogMetrics::new()?;
//! metrics.products_created.inc();
//! let body = metrics.encode()?;
//! ```

use std::time::Duration;

use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

const HTTP_LABELS: &[&str] = &["method", "endpoint", "status"];
const HTTP_ERROR_LABELS: &[&str] = &["method", "endpoint", "status", "error_type"];

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Business and golden-signal metrics.
#[derive(Clone)]
pub struct CatalogMetrics {
    registry: Registry,

    /// Products successfully created through the API.
    pub products_created: IntCounter,
    pub products_total: IntGauge,
    pub products_total_value: Gauge,
    pub products_average_price: Gauge,
    pub products_by_category: IntGaugeVec,

    pub http_request_duration: HistogramVec,
    pub http_requests_total: IntCounterVec,
    pub http_request_errors_total: IntCounterVec,
    pub http_in_flight_requests: IntGauge,
}

impl CatalogMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let products_created = IntCounter::new(
            "products_created_total",
            "Total number of products created",
        )?;
        let products_total = IntGauge::new("products_total", "Current number of products")?;
        let products_total_value = Gauge::new(
            "products_total_value",
            "Sum of all product prices",
        )?;
        let products_average_price = Gauge::new(
            "products_average_price",
            "Average product price",
        )?;
        let products_by_category = IntGaugeVec::new(
            Opts::new("products_by_category", "Number of products per category"),
            &["category"],
        )?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            HTTP_LABELS,
        )?;
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            HTTP_LABELS,
        )?;
        let http_request_errors_total = IntCounterVec::new(
            Opts::new(
                "http_request_errors_total",
                "Total number of HTTP requests answered with 4xx or 5xx",
            ),
            HTTP_ERROR_LABELS,
        )?;
        let http_in_flight_requests = IntGauge::new(
            "http_in_flight_requests",
            "Number of HTTP requests currently being served",
        )?;

        registry.register(Box::new(products_created.clone()))?;
        registry.register(Box::new(products_total.clone()))?;
        registry.register(Box::new(products_total_value.clone()))?;
        registry.register(Box::new(products_average_price.clone()))?;
        registry.register(Box::new(products_by_category.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_errors_total.clone()))?;
        registry.register(Box::new(http_in_flight_requests.clone()))?;

        Ok(Self {
            registry,
            products_created,
            products_total,
            products_total_value,
            products_average_price,
            products_by_category,
            http_request_duration,
            http_requests_total,
            http_request_errors_total,
            http_in_flight_requests,
        })
    }

    /// Overwrite the catalog gauges with a fresh snapshot.
    ///
    /// Per-category series are reset first so categories that vanished stop
    /// being reported.
    pub fn set_catalog<'a>(
        &self,
        total_products: u64,
        total_value: i64,
        average_price: f64,
        by_category: impl IntoIterator<Item = (&'a str, u64)>,
    ) {
        self.products_total
            .set(i64::try_from(total_products).unwrap_or(i64::MAX));
        self.products_total_value.set(total_value as f64);
        self.products_average_price.set(average_price);

        self.products_by_category.reset();
        for (category, count) in by_category {
            self.products_by_category
                .with_label_values(&[category])
                .set(i64::try_from(count).unwrap_or(i64::MAX));
        }
    }

    /// Record one finished HTTP request.
    pub fn observe_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let status_label = status.to_string();
        let labels = [method, endpoint, status_label.as_str()];

        self.http_request_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
        self.http_requests_total.with_label_values(&labels).inc();

        if let Some(error_type) = error_type(status) {
            self.http_request_errors_total
                .with_label_values(&[method, endpoint, status_label.as_str(), error_type])
                .inc();
        }
    }

    /// Count a request as in flight until the returned guard is dropped.
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.http_in_flight_requests.inc();
        InFlightGuard {
            gauge: self.http_in_flight_requests.clone(),
        }
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

impl std::fmt::Debug for CatalogMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogMetrics").finish_non_exhaustive()
    }
}

/// Decrements `http_in_flight_requests` on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

fn error_type(status: u16) -> Option<&'static str> {
    match status {
        400..=499 => Some("client_error"),
        500..=599 => Some("server_error"),
        _ => None,
    }
}
