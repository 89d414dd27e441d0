//! # Server Bootstrap
//!
//! Everything that has to succeed before the server may accept a request.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Resolve Schema Directory**: must exist and be a directory; the
//!    absolute path is used from here on.
//! 2. **Write Probe**: with uploads enabled, a probe file is created and
//!    removed so a read-only directory fails now instead of on the first
//!    upload.
//! 3. **Startup Banner**: every effective option, logged once.
//! 4. **Initial Scan**: every `*.json` file is compiled into the store.
//!    Individual files that fail are logged and skipped.
//!
//! Any failure here is fatal; the binary exits non-zero.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::state::AppState;

/// Errors during server bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The schemas directory does not exist.
    #[error("schemas directory does not exist: {}", path.display())]
    DirectoryMissing { path: PathBuf },

    /// The schemas path exists but is not a directory.
    #[error("schemas path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Uploads are enabled but the directory rejects writes.
    #[error("schemas directory is not writable: {}: {source}", path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The directory could not be listed.
    #[error("failed to scan schemas directory {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Run the startup checks and initial scan, returning a ready state.
pub fn bootstrap(mut config: AppConfig) -> Result<AppState, BootstrapError> {
    config.schemas_dir = resolve_schemas_dir(&config.schemas_dir)?;
    if config.allow_save_uploads {
        probe_writable(&config.schemas_dir)?;
    }
    log_banner(&config);

    let state = AppState::new(config);
    let report = state
        .reconciler
        .scan_all()
        .map_err(|source| BootstrapError::Scan {
            path: state.config.schemas_dir.clone(),
            source,
        })?;

    for (path, error) in &report.failed {
        tracing::warn!(path = %path.display(), error = %error, "schema skipped at startup");
    }
    tracing::info!(
        loaded = report.loaded.len(),
        skipped = report.failed.len(),
        "schema registry ready"
    );

    Ok(state)
}

fn resolve_schemas_dir(dir: &Path) -> Result<PathBuf, BootstrapError> {
    let resolved = std::fs::canonicalize(dir).map_err(|_| BootstrapError::DirectoryMissing {
        path: dir.to_path_buf(),
    })?;
    if !resolved.is_dir() {
        return Err(BootstrapError::NotADirectory { path: resolved });
    }
    Ok(resolved)
}

fn probe_writable(dir: &Path) -> Result<(), BootstrapError> {
    let probe = dir.join(format!(".write-probe-{}", std::process::id()));
    std::fs::write(&probe, b"")
        .and_then(|()| std::fs::remove_file(&probe))
        .map_err(|source| BootstrapError::NotWritable {
            path: dir.to_path_buf(),
            source,
        })
}

fn log_banner(config: &AppConfig) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        hostname = %config.hostname,
        port = config.port,
        schemas_dir = %config.schemas_dir.display(),
        allow_save_uploads = config.allow_save_uploads,
        verbose = config.verbose,
        default_spec = %config.default_spec,
        default_output_level = %config.default_output_level,
        max_upload_bytes = config.max_upload_bytes,
        "starting schemagate"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::new(tmp.path().join("absent"));
        let err = bootstrap(config).unwrap_err();
        assert!(matches!(err, BootstrapError::DirectoryMissing { .. }), "{err}");
    }

    #[test]
    fn file_instead_of_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("schemas");
        std::fs::write(&file, "").unwrap();
        let err = bootstrap(AppConfig::new(&file)).unwrap_err();
        assert!(matches!(err, BootstrapError::NotADirectory { .. }), "{err}");
    }

    #[test]
    fn loads_existing_schemas_and_skips_broken_ones() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.json"), r#"{"type":"object"}"#).unwrap();
        std::fs::write(tmp.path().join("b.json"), "{").unwrap();

        let state = bootstrap(AppConfig::new(tmp.path())).unwrap();
        let names: Vec<String> = state.store.names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["a.json"]);
        assert!(state.config.schemas_dir.is_absolute());
    }

    #[test]
    fn write_probe_leaves_no_file_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::new(tmp.path());
        config.allow_save_uploads = true;
        bootstrap(config).unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
