//! # schemagate-registry: Schema Registry & Validation Pipeline
//!
//! Owns every piece of mutable state in the validation server and the rules
//! for changing it.
//!
//! ## Components
//!
//! - **Store** (`store.rs`): concurrent map from [`SchemaName`] to a compiled
//!   [`SchemaEntry`]. Entries are immutable and swapped whole, so readers
//!   never observe a half-updated schema.
//!
//! - **Ingestion** (`ingest.rs`): the single path by which bytes become a
//!   stored schema, whether they arrive by upload, startup scan, or change
//!   notification.
//!
//! - **Reconciler** (`reconcile.rs`): startup scan of the schema directory
//!   and hot reload on file changes. A failed reload keeps the last good
//!   entry.
//!
//! - **Orchestrator** (`orchestrator.rs`): request-scoped validation against
//!   a stored or inline schema.
//!
//! - **Statistics** (`stats.rs`): per-request-path pass/fail counters.
//!
//! [`SchemaName`]: schemagate_core::SchemaName

pub mod ingest;
pub mod orchestrator;
pub mod reconcile;
pub mod stats;
pub mod store;

pub use ingest::{IngestError, IngestPipeline, IngestRequest, Origin};
pub use orchestrator::{Orchestrator, ValidateError, ValidationReport};
pub use reconcile::{
    schema_paths, ChangeOutcome, DirectoryReconciler, ReloadError, ScanReport, WatchHandle,
};
pub use stats::{PathStats, StatsAggregator};
pub use store::{SchemaEntry, SchemaStore};
