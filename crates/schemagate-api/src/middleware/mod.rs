//! # HTTP Middleware
//!
//! - `metrics`: request counters and latency per route.
//! - `tracing_layer`: request spans via `tower_http::trace`.

pub mod metrics;
pub mod tracing_layer;
