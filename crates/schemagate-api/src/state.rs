//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Every field is a cheap handle: cloning `AppState` shares the same schema
//! store, statistics, and pipeline. Nothing here is a global; tests build
//! as many independent states as they need.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use schemagate_registry::{
    DirectoryReconciler, IngestPipeline, Orchestrator, SchemaStore, StatsAggregator,
};
use schemagate_schema::{JsonSchemaCompiler, SchemaCompiler};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: SchemaStore,
    pub stats: StatsAggregator,
    pub pipeline: Arc<IngestPipeline>,
    pub orchestrator: Orchestrator,
    pub reconciler: Arc<DirectoryReconciler>,
    /// Renders `/metrics`; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire a fresh, empty registry for `config`.
    ///
    /// Does not touch the filesystem; see [`crate::bootstrap::bootstrap`]
    /// for the startup checks and initial scan.
    pub fn new(config: AppConfig) -> Self {
        Self::with_compiler(config, Arc::new(JsonSchemaCompiler::new()))
    }

    /// Like [`new`](Self::new) with a caller-supplied compiler.
    pub fn with_compiler(config: AppConfig, compiler: Arc<dyn SchemaCompiler>) -> Self {
        let store = SchemaStore::new();
        let stats = StatsAggregator::new();
        let pipeline = Arc::new(IngestPipeline::new(
            store.clone(),
            Arc::clone(&compiler),
            config.schemas_dir.clone(),
            config.max_upload_bytes,
        ));
        let orchestrator = Orchestrator::new(store.clone(), stats.clone(), compiler);
        let reconciler = Arc::new(DirectoryReconciler::new(
            Arc::clone(&pipeline),
            config.default_spec,
        ));

        Self {
            config: Arc::new(config),
            store,
            stats,
            pipeline,
            orchestrator,
            reconciler,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
