//! # Directory Reconciler
//!
//! Keeps the [`SchemaStore`](crate::SchemaStore) in sync with the schema
//! directory: a full scan at startup, then one reload per change
//! notification.
//!
//! ## Availability over Freshness
//!
//! A reload that fails (unreadable file, half-written JSON, compile error)
//! is logged and dropped. The store keeps serving the last good validator
//! for that name until a later notification produces bytes that ingest
//! cleanly. Failed reloads are not retried on a timer; the next write to
//! the file triggers the next attempt.
//!
//! ## Watching
//!
//! [`DirectoryReconciler::watch`] bridges `notify` callbacks onto a
//! `tokio::sync::mpsc` channel drained by exactly one task, so reloads are
//! handled one at a time. Each reload runs on the blocking pool because it
//! reads from disk and compiles.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use schemagate_core::{SchemaName, SchemaNameError, SpecVersion};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ingest::{IngestError, IngestPipeline, IngestRequest, Origin};
use crate::store::SchemaEntry;

/// A schema file could not be (re)loaded.
#[derive(Error, Debug)]
pub enum ReloadError {
    /// The file could not be read.
    #[error("failed to read schema file {}: {source}", path.display())]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The bytes were read but did not ingest.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// What a change notification led to.
#[derive(Debug)]
pub enum ChangeOutcome {
    /// The path is not a schema file.
    Ignored,
    /// The schema was recompiled and committed.
    Reloaded(Arc<SchemaEntry>),
    /// The reload failed; any previous entry is still being served.
    Rejected(ReloadError),
    /// Another writer committed the name while the file was compiling; its
    /// entry was kept.
    Superseded,
}

/// Result of a full directory scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Schemas committed by the scan, in file-name order.
    pub loaded: Vec<SchemaName>,
    /// Files that failed, with the reason.
    pub failed: Vec<(PathBuf, ReloadError)>,
}

/// Drives the ingestion pipeline from the contents of the schema directory.
#[derive(Debug, Clone)]
pub struct DirectoryReconciler {
    pipeline: Arc<IngestPipeline>,
    default_spec: SpecVersion,
}

impl DirectoryReconciler {
    /// Create a reconciler compiling new schemas under `default_spec`.
    pub fn new(pipeline: Arc<IngestPipeline>, default_spec: SpecVersion) -> Self {
        Self {
            pipeline,
            default_spec,
        }
    }

    /// Load every `*.json` file in the schema directory.
    ///
    /// Per-file failures are logged and reported, never fatal. Only a
    /// failure to list the directory itself is returned as an error.
    pub fn scan_all(&self) -> io::Result<ScanReport> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(self.pipeline.schema_dir())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && SchemaName::from_path(path).is_some())
            .collect();
        paths.sort();

        let mut report = ScanReport::default();
        for path in paths {
            match self.reload(&path, Origin::DiskScan) {
                Ok(entry) => report.loaded.push(entry.name.clone()),
                Err(ReloadError::Ingest(IngestError::Superseded(name))) => {
                    tracing::debug!(schema = %name, "schema committed elsewhere during scan");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load schema");
                    report.failed.push((path, e));
                }
            }
        }

        tracing::info!(
            dir = %self.pipeline.schema_dir().display(),
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "schema directory scanned"
        );
        Ok(report)
    }

    /// Handle one change notification for `path`.
    ///
    /// Safe to call with duplicate or stale notifications: re-ingesting
    /// unchanged bytes yields an equivalent entry. Paths outside the schema
    /// directory are ignored.
    pub fn on_change(&self, path: &Path) -> ChangeOutcome {
        if path.parent() != Some(self.pipeline.schema_dir())
            || SchemaName::from_path(path).is_none()
        {
            return ChangeOutcome::Ignored;
        }

        let outcome = match self.reload(path, Origin::ChangeEvent) {
            Ok(entry) => {
                tracing::info!(schema = %entry.name, "reloaded schema");
                ChangeOutcome::Reloaded(entry)
            }
            Err(ReloadError::Ingest(IngestError::Superseded(name))) => {
                tracing::debug!(schema = %name, "schema replaced during reload; keeping newer entry");
                ChangeOutcome::Superseded
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to reload schema; keeping previous version"
                );
                ChangeOutcome::Rejected(e)
            }
        };

        let label = match &outcome {
            ChangeOutcome::Reloaded(_) => "reloaded",
            ChangeOutcome::Superseded => "superseded",
            _ => "rejected",
        };
        metrics::counter!("schemagate_reloads_total", "outcome" => label).increment(1);
        outcome
    }

    /// Read the current bytes for `path` from the schema directory and
    /// ingest them without re-persisting.
    ///
    /// A schema that is already loaded keeps the version it was compiled
    /// under, so a reload triggered by an upload's own write does not
    /// silently switch it to the default version. The commit is conditional
    /// on that entry still being current: if an upload lands while this
    /// reload compiles, the upload's entry wins.
    fn reload(&self, path: &Path, origin: Origin) -> Result<Arc<SchemaEntry>, ReloadError> {
        let name = SchemaName::from_path(path)
            .unwrap_or(Err(SchemaNameError::Empty))
            .map_err(IngestError::from)?;
        let file = name
            .resolve_in(self.pipeline.schema_dir())
            .map_err(IngestError::from)?;
        let bytes = std::fs::read(&file).map_err(|source| ReloadError::Read {
            path: file.clone(),
            source,
        })?;

        let current = self.pipeline.store().get(&name);
        let spec = current
            .as_ref()
            .map(|entry| entry.spec)
            .unwrap_or(self.default_spec);

        let entry = self.pipeline.ingest_over(
            IngestRequest::from_disk(name.as_str(), &bytes, spec, origin),
            current.as_ref(),
        )?;
        Ok(entry)
    }

    /// Start watching the schema directory.
    ///
    /// Must be called from within a Tokio runtime. Dropping the returned
    /// handle stops the watcher, which closes the channel and ends the
    /// consumer task.
    pub fn watch(self: Arc<Self>) -> Result<WatchHandle, notify::Error> {
        let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for path in schema_paths(&event) {
                        if tx.send(path).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "schema directory watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(self.pipeline.schema_dir(), RecursiveMode::NonRecursive)?;

        let reconciler = Arc::clone(&self);
        let task = tokio::spawn(async move {
            while let Some(path) = rx.recv().await {
                let r = Arc::clone(&reconciler);
                if let Err(e) = tokio::task::spawn_blocking(move || r.on_change(&path)).await {
                    tracing::error!(error = %e, "schema reload task panicked");
                }
            }
            tracing::debug!("schema watch channel closed");
        });

        tracing::info!(dir = %self.pipeline.schema_dir().display(), "watching schema directory");
        Ok(WatchHandle {
            _watcher: watcher,
            task,
        })
    }
}

/// Keeps the directory watcher alive.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Whether the consumer task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Schema file paths touched by a create or modify event.
///
/// Removals are ignored: a deleted file leaves its last good entry in place.
pub fn schema_paths(event: &Event) -> Vec<PathBuf> {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| SchemaName::from_path(path).is_some())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SchemaStore;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use schemagate_schema::JsonSchemaCompiler;
    use serde_json::json;

    fn reconciler(dir: &Path) -> DirectoryReconciler {
        let pipeline = IngestPipeline::new(
            SchemaStore::new(),
            Arc::new(JsonSchemaCompiler::new()),
            dir,
            1024,
        );
        DirectoryReconciler::new(Arc::new(pipeline), SpecVersion::Draft7)
    }

    fn write(dir: &Path, file: &str, contents: &str) -> PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn scan_loads_good_files_and_skips_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "person.json", r#"{"required":["name"]}"#);
        write(dir.path(), "broken.json", "{");
        write(dir.path(), "badschema.json", r#"{"type": 12}"#);
        write(dir.path(), "notes.txt", "not a schema");
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let r = reconciler(dir.path());
        let report = r.scan_all().unwrap();

        let loaded: Vec<&str> = report.loaded.iter().map(|n| n.as_str()).collect();
        assert_eq!(loaded, vec!["person.json"]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(r.pipeline.store().names().len(), 1);
    }

    #[test]
    fn scan_of_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let r = reconciler(&dir.path().join("absent"));
        assert!(r.scan_all().is_err());
    }

    #[test]
    fn change_reloads_new_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "s.json", r#"{"type":"string"}"#);
        let r = reconciler(dir.path());
        r.scan_all().unwrap();

        write(dir.path(), "s.json", r#"{"type":"integer"}"#);
        match r.on_change(&path) {
            ChangeOutcome::Reloaded(entry) => {
                assert!(entry.validator.validate(&json!(1)).valid);
                assert!(!entry.validator.validate(&json!("x")).valid);
            }
            other => panic!("expected Reloaded, got: {other:?}"),
        }
    }

    #[test]
    fn failed_reload_keeps_last_good_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "s.json", r#"{"type":"string"}"#);
        let r = reconciler(dir.path());
        r.scan_all().unwrap();

        write(dir.path(), "s.json", r#"{"type": "#);
        assert!(matches!(r.on_change(&path), ChangeOutcome::Rejected(_)));

        let name = SchemaName::parse("s").unwrap();
        let entry = r.pipeline.store().get(&name).unwrap();
        assert!(entry.validator.validate(&json!("still a string")).valid);
        assert!(!entry.validator.validate(&json!(1)).valid);
    }

    #[test]
    fn vanished_file_keeps_last_good_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "s.json", r#"{"type":"string"}"#);
        let r = reconciler(dir.path());
        r.scan_all().unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            r.on_change(&path),
            ChangeOutcome::Rejected(ReloadError::Read { .. })
        ));
        assert_eq!(r.pipeline.store().len(), 1);
    }

    #[test]
    fn duplicate_notifications_are_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "s.json", r#"{"type":"string"}"#);
        let r = reconciler(dir.path());
        for _ in 0..3 {
            assert!(matches!(r.on_change(&path), ChangeOutcome::Reloaded(_)));
        }
        assert_eq!(r.pipeline.store().len(), 1);
    }

    #[test]
    fn reload_keeps_existing_spec_version() {
        let dir = tempfile::tempdir().unwrap();
        let r = reconciler(dir.path());
        r.pipeline
            .ingest(IngestRequest::upload(
                "s",
                br#"{"type":"string"}"#,
                SpecVersion::Draft2020,
            ))
            .unwrap();

        match r.on_change(&dir.path().join("s.json")) {
            ChangeOutcome::Reloaded(entry) => assert_eq!(entry.spec, SpecVersion::Draft2020),
            other => panic!("expected Reloaded, got: {other:?}"),
        }
    }

    #[test]
    fn non_schema_paths_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let r = reconciler(dir.path());
        assert!(matches!(
            r.on_change(&dir.path().join(".s.json.abc.tmp")),
            ChangeOutcome::Ignored
        ));
        assert!(matches!(
            r.on_change(&dir.path().join("readme.md")),
            ChangeOutcome::Ignored
        ));

        // Same file name, different directory: must not reload `s.json` here.
        write(dir.path(), "s.json", r#"{"type":"string"}"#);
        let elsewhere = tempfile::tempdir().unwrap();
        let outside = write(elsewhere.path(), "s.json", r#"{"type":"string"}"#);
        assert!(matches!(r.on_change(&outside), ChangeOutcome::Ignored));
        assert!(matches!(
            r.on_change(&dir.path().join("nested").join("s.json")),
            ChangeOutcome::Ignored
        ));
        assert!(r.pipeline.store().is_empty());
    }

    #[test]
    fn schema_paths_filters_kinds_and_extensions() {
        let create = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/s/a.json"))
            .add_path(PathBuf::from("/s/.a.json.1.tmp"));
        assert_eq!(schema_paths(&create), vec![PathBuf::from("/s/a.json")]);

        let modify = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/s/b.json"));
        assert_eq!(schema_paths(&modify), vec![PathBuf::from("/s/b.json")]);

        let remove = Event::new(EventKind::Remove(RemoveKind::File)).add_path(PathBuf::from("/s/a.json"));
        assert!(schema_paths(&remove).is_empty());
    }

    #[tokio::test]
    async fn watch_starts_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let r = Arc::new(reconciler(dir.path()));
        let handle = r.watch().unwrap();
        assert!(handle.is_running());
        drop(handle);
    }
}
