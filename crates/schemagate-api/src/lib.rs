//! # schemagate-api: HTTP Surface for the Schema Registry
//!
//! Axum service over `schemagate-registry`: validate documents against
//! stored or inline schemas, manage stored schemas, and report statistics.
//!
//! ## API Surface
//!
//! | Route                        | Module                 |
//! |------------------------------|------------------------|
//! | `POST /validate/{schema}`    | [`routes::validate`]   |
//! | `POST /validatewithschema`   | [`routes::validate`]   |
//! | `GET/POST /schema/{schema}`  | [`routes::schemas`]    |
//! | `GET /schemas`               | [`routes::schemas`]    |
//! | `GET /stats`                 | [`routes::stats`]      |
//! | `GET /openapi.json`          | [`openapi`]            |
//! | `GET /metrics`               | Prometheus exposition  |
//! | `GET /health/*`              | liveness / readiness   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod output;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

pub use config::{AppConfig, ServerArgs};
pub use error::AppError;
pub use state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::validate::router())
        .merge(routes::schemas::router())
        .merge(routes::stats::router())
        .merge(openapi::router())
        .route("/metrics", get(prometheus_metrics))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. Always 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The router is only built after the initial scan.
async fn readiness() -> &'static str {
    "ready"
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
