//! # Statistics Endpoint
//!
//! `GET /stats`: per-request-path counters since process start.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use schemagate_registry::PathStats;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Counters for one request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PathStatsBody {
    /// Validations served on the path.
    pub requests: u64,
    /// Validations that passed.
    pub passes: u64,
    /// Validations that failed.
    pub fails: u64,
}

impl From<PathStats> for PathStatsBody {
    fn from(s: PathStats) -> Self {
        Self {
            requests: s.requests,
            passes: s.passes,
            fails: s.fails,
        }
    }
}

/// Build the statistics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

/// GET /stats: Validation counters keyed by request path.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Counters keyed by request path", body = BTreeMap<String, PathStatsBody>),
    ),
    tag = "stats"
)]
async fn get_stats(State(state): State<AppState>) -> Json<BTreeMap<String, PathStatsBody>> {
    Json(
        state
            .stats
            .snapshot()
            .into_iter()
            .map(|(path, stats)| (path, stats.into()))
            .collect(),
    )
}
