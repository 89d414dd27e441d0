//! # Ingestion Pipeline
//!
//! Turns raw schema bytes from any source (upload, startup scan, change
//! notification) into a committed [`SchemaEntry`].
//!
//! ## Gates
//!
//! Each gate is hard: a failure aborts the ingestion with no effect on the
//! store or the schema directory.
//!
//! 1. **Name**: [`SchemaName::parse`] plus a resolve check against the
//!    schema directory.
//! 2. **Size**: uploads only; bytes beyond the configured limit.
//! 3. **Syntax**: bytes must parse as JSON.
//! 4. **Compile**: the compiler's [`CompileError`] is returned unmodified.
//! 5. **Persist**: only when requested. Pretty-printed bytes go to a
//!    temporary sibling which is then renamed over the target, so the
//!    directory never holds a half-written schema.
//! 6. **Commit**: [`SchemaStore::put`], or [`SchemaStore::put_if_current`]
//!    for [`IngestPipeline::ingest_over`], which refuses to overwrite an
//!    entry committed while the bytes were compiling.
//!
//! Compile happens before persist, and persist before commit: the store
//! never references a validator whose bytes failed to reach disk, and the
//! store can always be rebuilt by re-ingesting the directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use schemagate_core::{SchemaName, SchemaNameError, SpecVersion};
use schemagate_schema::{CompileError, SchemaCompiler};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::store::{SchemaEntry, SchemaStore};

/// Where the bytes being ingested came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Supplied by a client over the wire.
    Upload,
    /// Read from the schema directory during the startup scan.
    DiskScan,
    /// Read from the schema directory after a change notification.
    ChangeEvent,
}

impl Origin {
    /// Metric/log label for this origin.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::DiskScan => "disk_scan",
            Self::ChangeEvent => "change_event",
        }
    }
}

/// A pending ingestion. Exists only for the duration of one
/// [`IngestPipeline::ingest`] call.
#[derive(Debug, Clone, Copy)]
pub struct IngestRequest<'a> {
    /// Requested schema name; `.json` is appended if missing.
    pub name: &'a str,
    /// Raw schema bytes.
    pub bytes: &'a [u8],
    /// Version to compile under.
    pub spec: SpecVersion,
    /// Source of the bytes.
    pub origin: Origin,
    /// Whether to write the bytes to the schema directory before commit.
    pub persist: bool,
}

impl<'a> IngestRequest<'a> {
    /// An upload: size-gated and persisted.
    pub fn upload(name: &'a str, bytes: &'a [u8], spec: SpecVersion) -> Self {
        Self {
            name,
            bytes,
            spec,
            origin: Origin::Upload,
            persist: true,
        }
    }

    /// Bytes already on disk: neither size-gated nor re-persisted.
    pub fn from_disk(name: &'a str, bytes: &'a [u8], spec: SpecVersion, origin: Origin) -> Self {
        Self {
            name,
            bytes,
            spec,
            origin,
            persist: false,
        }
    }
}

/// Error raised by an ingestion gate.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The target name is unsafe or malformed.
    #[error(transparent)]
    NameRejected(#[from] SchemaNameError),

    /// The upload exceeds the configured maximum.
    #[error("uploaded schema is too large: {size} bytes exceeds the {limit}-byte limit")]
    TooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The bytes are not a JSON document.
    #[error("invalid JSON schema: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The document is JSON but not a compilable schema.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Writing the schema to the schema directory failed.
    #[error("failed to save schema to {}: {source}", path.display())]
    Persist {
        /// Target path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The store's entry for the name changed while these bytes were being
    /// compiled; the newer entry was kept.
    #[error("schema {0} was replaced during ingestion")]
    Superseded(SchemaName),
}

impl IngestError {
    /// Short label for the gate that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NameRejected(_) => "name_rejected",
            Self::TooLarge { .. } => "too_large",
            Self::MalformedJson(_) => "malformed_json",
            Self::Compile(_) => "compile_failed",
            Self::Persist { .. } => "persist_failed",
            Self::Superseded(_) => "superseded",
        }
    }
}

/// How the commit gate treats the entry already stored under the name.
#[derive(Debug, Clone, Copy)]
enum Commit<'e> {
    /// Replace whatever is there.
    Always,
    /// Replace only if the store still holds this entry (`None`: nothing).
    IfCurrent(Option<&'e Arc<SchemaEntry>>),
}

/// Gatekeeper between raw bytes and the [`SchemaStore`].
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    store: SchemaStore,
    compiler: Arc<dyn SchemaCompiler>,
    schema_dir: PathBuf,
    max_upload_bytes: usize,
}

impl IngestPipeline {
    /// Create a pipeline committing into `store` and persisting under
    /// `schema_dir`.
    pub fn new(
        store: SchemaStore,
        compiler: Arc<dyn SchemaCompiler>,
        schema_dir: impl Into<PathBuf>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            store,
            compiler,
            schema_dir: schema_dir.into(),
            max_upload_bytes,
        }
    }

    /// The schema directory.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// The store this pipeline commits into.
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Run every gate and commit on success.
    pub fn ingest(&self, request: IngestRequest<'_>) -> Result<Arc<SchemaEntry>, IngestError> {
        self.ingest_with(request, Commit::Always)
    }

    /// Like [`ingest`](Self::ingest), but the commit only goes through if
    /// the store still holds `current` for the name. Otherwise fails with
    /// [`IngestError::Superseded`] and leaves the newer entry in place.
    pub fn ingest_over(
        &self,
        request: IngestRequest<'_>,
        current: Option<&Arc<SchemaEntry>>,
    ) -> Result<Arc<SchemaEntry>, IngestError> {
        self.ingest_with(request, Commit::IfCurrent(current))
    }

    fn ingest_with(
        &self,
        request: IngestRequest<'_>,
        commit: Commit<'_>,
    ) -> Result<Arc<SchemaEntry>, IngestError> {
        let result = self.run_gates(request, commit);
        let outcome = match &result {
            Ok(_) => "committed",
            Err(e) => e.stage(),
        };
        metrics::counter!(
            "schemagate_ingest_total",
            "origin" => request.origin.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        result
    }

    fn run_gates(
        &self,
        request: IngestRequest<'_>,
        commit: Commit<'_>,
    ) -> Result<Arc<SchemaEntry>, IngestError> {
        let name = SchemaName::parse(request.name)?;
        let path = name.resolve_in(&self.schema_dir)?;

        if request.origin == Origin::Upload && request.bytes.len() > self.max_upload_bytes {
            return Err(IngestError::TooLarge {
                size: request.bytes.len(),
                limit: self.max_upload_bytes,
            });
        }

        let document: Value =
            serde_json::from_slice(request.bytes).map_err(IngestError::MalformedJson)?;

        let validator = self.compiler.compile(&document, request.spec)?;

        if request.persist {
            write_atomically(&self.schema_dir, &name, &path, &document)
                .map_err(|source| IngestError::Persist { path, source })?;
        }

        let entry = Arc::new(SchemaEntry {
            name,
            validator,
            spec: request.spec,
            document: Arc::new(document),
            loaded_at: Utc::now(),
        });
        let replaced = match commit {
            Commit::Always => self.store.put(Arc::clone(&entry)).is_some(),
            Commit::IfCurrent(current) => {
                if !self.store.put_if_current(Arc::clone(&entry), current) {
                    return Err(IngestError::Superseded(entry.name.clone()));
                }
                current.is_some()
            }
        };

        tracing::info!(
            schema = %entry.name,
            spec = %entry.spec,
            origin = request.origin.as_str(),
            replaced,
            "schema committed"
        );
        Ok(entry)
    }
}

/// Write `document` pretty-printed to `path` via a temporary sibling.
///
/// The temporary name starts with `.` and ends in `.tmp`, so directory
/// scans and change notifications never treat it as a schema.
fn write_atomically(dir: &Path, name: &SchemaName, path: &Path, document: &Value) -> io::Result<()> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');

    let tmp = dir.join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));
    let result = std::fs::write(&tmp, &bytes).and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}
