//! # Server Configuration
//!
//! Command-line flags ([`ServerArgs`]) and the validated configuration the
//! rest of the server runs on ([`AppConfig`]). Flag values that are
//! syntactically fine but out of range are rejected here, before anything
//! touches the filesystem or binds a socket.

use std::path::PathBuf;

use clap::Parser;
use schemagate_core::SpecVersion;
use thiserror::Error;

use crate::output::OutputLevel;

/// Smallest accepted `--max-upload-size`, in megabytes.
pub const MIN_UPLOAD_MB: u64 = 1;

/// Largest accepted `--max-upload-size`, in megabytes.
pub const MAX_UPLOAD_MB: u64 = 100;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Rejected flag value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid max upload size: {0} MB (valid range: 1-100)")]
    UploadSize(u64),
}

/// JSON schema validation server.
///
/// Loads every `*.json` file from the schemas directory, keeps them compiled
/// in memory, reloads them when they change on disk, and validates submitted
/// documents against them over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "schemagate", version, about, long_about = None)]
pub struct ServerArgs {
    /// Hostname to bind the server to.
    #[arg(long, default_value = "localhost")]
    pub hostname: String,

    /// Port to bind the server to.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Directory to load JSON schemas from.
    #[arg(long, default_value = "./schemas")]
    pub schemas_dir: PathBuf,

    /// Allow schema uploads and save them to the schemas directory.
    #[arg(long)]
    pub allow_save_uploads: bool,

    /// Log every request and reload at debug level.
    #[arg(long)]
    pub verbose: bool,

    /// Default JSON Schema version for uploads and inline schemas.
    #[arg(long, default_value_t = SpecVersion::Draft7)]
    pub default_spec: SpecVersion,

    /// Maximum upload size in megabytes (valid range: 1-100).
    #[arg(long, default_value_t = 2)]
    pub max_upload_size: u64,

    /// Default output level for validation responses.
    #[arg(long = "default-outputlevel", default_value_t = OutputLevel::Basic)]
    pub default_output_level: OutputLevel,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host the listener binds to.
    pub hostname: String,
    /// Port the listener binds to.
    pub port: u16,
    /// Directory schemas are loaded from and uploads are saved to.
    pub schemas_dir: PathBuf,
    /// Whether `POST /schema/{schema}` is enabled.
    pub allow_save_uploads: bool,
    /// Debug-level logging for requests and reloads.
    pub verbose: bool,
    /// Version for uploads, inline schemas and newly discovered files.
    pub default_spec: SpecVersion,
    /// Output level when a request does not pass `outputlevel`.
    pub default_output_level: OutputLevel,
    /// Upload limit in bytes.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Configuration with every flag at its default value.
    pub fn new(schemas_dir: impl Into<PathBuf>) -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 8080,
            schemas_dir: schemas_dir.into(),
            allow_save_uploads: false,
            verbose: false,
            default_spec: SpecVersion::default(),
            default_output_level: OutputLevel::default(),
            max_upload_bytes: 2 * BYTES_PER_MB,
        }
    }

    /// `hostname:port`, as passed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl TryFrom<ServerArgs> for AppConfig {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        if !(MIN_UPLOAD_MB..=MAX_UPLOAD_MB).contains(&args.max_upload_size) {
            return Err(ConfigError::UploadSize(args.max_upload_size));
        }

        Ok(Self {
            hostname: args.hostname,
            port: args.port,
            schemas_dir: args.schemas_dir,
            allow_save_uploads: args.allow_save_uploads,
            verbose: args.verbose,
            default_spec: args.default_spec,
            default_output_level: args.default_output_level,
            max_upload_bytes: args.max_upload_size as usize * BYTES_PER_MB,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<AppConfig, ConfigError> {
        let mut argv = vec!["schemagate"];
        argv.extend_from_slice(args);
        AppConfig::try_from(ServerArgs::parse_from(argv))
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.bind_address(), "localhost:8080");
        assert_eq!(config.schemas_dir, PathBuf::from("./schemas"));
        assert!(!config.allow_save_uploads);
        assert!(!config.verbose);
        assert_eq!(config.default_spec, SpecVersion::Draft7);
        assert_eq!(config.default_output_level, OutputLevel::Basic);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn explicit_flags() {
        let config = parse(&[
            "--hostname",
            "0.0.0.0",
            "--port",
            "9000",
            "--schemas-dir",
            "/srv/schemas",
            "--allow-save-uploads",
            "--verbose",
            "--default-spec",
            "draft2020",
            "--max-upload-size",
            "100",
            "--default-outputlevel",
            "verbose",
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert!(config.allow_save_uploads);
        assert!(config.verbose);
        assert_eq!(config.default_spec, SpecVersion::Draft2020);
        assert_eq!(config.default_output_level, OutputLevel::Verbose);
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn upload_size_out_of_range() {
        assert_eq!(
            parse(&["--max-upload-size", "0"]).unwrap_err(),
            ConfigError::UploadSize(0)
        );
        assert_eq!(
            parse(&["--max-upload-size", "101"]).unwrap_err(),
            ConfigError::UploadSize(101)
        );
        assert!(parse(&["--max-upload-size", "1"]).is_ok());
    }

    #[test]
    fn unknown_spec_is_a_parse_error() {
        let result = ServerArgs::try_parse_from(["schemagate", "--default-spec", "draft3"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_output_level_is_a_parse_error() {
        let result =
            ServerArgs::try_parse_from(["schemagate", "--default-outputlevel", "loud"]);
        assert!(result.is_err());
    }
}
