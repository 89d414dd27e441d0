//! # Request Metrics
//!
//! Counts every response by route template and status, and records request
//! latency. Values go to whatever `metrics` recorder is installed; the
//! binary installs the Prometheus exporter, tests install none and the
//! calls are no-ops.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Middleware recording `schemagate_http_requests_total` and
/// `schemagate_http_request_duration_seconds`.
///
/// Labels use the matched route template (`/validate/{schema}`), not the
/// raw path, so schema names do not multiply series.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "schemagate_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "schemagate_http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(started.elapsed().as_secs_f64());

    response
}
