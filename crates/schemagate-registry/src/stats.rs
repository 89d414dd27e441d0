//! # Statistics Aggregator
//!
//! Per-request-path pass/fail counters. Keys are the request path the
//! caller was served on, not the schema name, so two endpoints targeting
//! the same schema are tracked separately.
//!
//! Every critical section is a single map lookup plus two increments under
//! one `parking_lot::Mutex`. [`StatsAggregator::snapshot`] hands out a value
//! copy, so callers serialize without holding the lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Counters for one request path. `requests == passes + fails` always.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStats {
    /// Validations served on the path.
    pub requests: u64,
    /// Validations whose document was valid.
    pub passes: u64,
    /// Validations whose document was rejected.
    pub fails: u64,
}

/// Shared, cloneable statistics registry.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    paths: Arc<Mutex<HashMap<String, PathStats>>>,
}

impl StatsAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one validation served on `path`.
    pub fn record(&self, path: &str, passed: bool) {
        {
            let mut paths = self.paths.lock();
            let stats = paths.entry(path.to_string()).or_default();
            stats.requests += 1;
            if passed {
                stats.passes += 1;
            } else {
                stats.fails += 1;
            }
        }

        metrics::counter!(
            "schemagate_validations_total",
            "path" => path.to_string(),
            "result" => if passed { "pass" } else { "fail" }
        )
        .increment(1);
    }

    /// Copy of all counters, ordered by path.
    pub fn snapshot(&self) -> BTreeMap<String, PathStats> {
        self.paths
            .lock()
            .iter()
            .map(|(path, stats)| (path.clone(), *stats))
            .collect()
    }

    /// Counters for a single path, if any request has been recorded on it.
    pub fn get(&self, path: &str) -> Option<PathStats> {
        self.paths.lock().get(path).copied()
    }
}
