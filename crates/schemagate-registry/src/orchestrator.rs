//! # Validation Orchestrator
//!
//! Request-scoped flow from inbound bytes to a [`ValidationReport`]:
//! resolve the validator, parse the document, validate, record statistics.
//!
//! - [`Orchestrator::validate_by_name`] reads the [`SchemaStore`].
//! - [`Orchestrator::validate_inline`] compiles the caller's schema on the
//!   fly and never touches the store, so inline traffic does not contend
//!   with registry writers.
//!
//! Statistics are recorded only once a validation has actually run.

use std::sync::Arc;

use schemagate_core::{SchemaName, SpecVersion};
use schemagate_schema::{CompileError, SchemaCompiler, ValidationOutcome};
use serde_json::Value;
use thiserror::Error;

use crate::stats::StatsAggregator;
use crate::store::SchemaStore;

/// Why a validation request produced no outcome.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// No schema with this name is loaded.
    #[error("schema not found: {0}")]
    NotFound(String),

    /// The submitted document is not JSON.
    #[error("invalid JSON: {0}")]
    BadDocument(#[source] serde_json::Error),

    /// The inline schema bytes are not JSON.
    #[error("invalid schema: {0}")]
    MalformedSchema(#[source] serde_json::Error),

    /// The schema did not compile under the requested version.
    #[error(transparent)]
    BadSchema(#[from] CompileError),
}

/// Outcome plus the context it was produced in.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Registry schema used, `None` for inline schemas.
    pub schema: Option<SchemaName>,
    /// Version the document was validated under.
    pub spec: SpecVersion,
    /// Pass/fail and violations.
    pub outcome: ValidationOutcome,
}

/// Turns validation requests into reports.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: SchemaStore,
    stats: StatsAggregator,
    compiler: Arc<dyn SchemaCompiler>,
}

impl Orchestrator {
    /// Create an orchestrator over a store and a statistics sink.
    pub fn new(store: SchemaStore, stats: StatsAggregator, compiler: Arc<dyn SchemaCompiler>) -> Self {
        Self {
            store,
            stats,
            compiler,
        }
    }

    /// Validate `document` against the stored schema `name`.
    ///
    /// With a `spec_override` that differs from the version the entry was
    /// compiled under, a transient validator is compiled from the entry's
    /// document; the store is not modified.
    pub fn validate_by_name(
        &self,
        request_path: &str,
        name: &str,
        document: &[u8],
        spec_override: Option<SpecVersion>,
    ) -> Result<ValidationReport, ValidateError> {
        let entry = SchemaName::parse(name)
            .ok()
            .and_then(|name| self.store.get(&name))
            .ok_or_else(|| ValidateError::NotFound(name.to_string()))?;

        let document: Value = serde_json::from_slice(document).map_err(ValidateError::BadDocument)?;

        let (validator, spec) = match spec_override {
            Some(spec) if spec != entry.spec => (self.compiler.compile(&entry.document, spec)?, spec),
            _ => (Arc::clone(&entry.validator), entry.spec),
        };

        let outcome = validator.validate(&document);
        self.stats.record(request_path, outcome.valid);
        tracing::debug!(
            path = request_path,
            schema = %entry.name,
            spec = %spec,
            valid = outcome.valid,
            errors = outcome.errors.len(),
            "validated against stored schema"
        );

        Ok(ValidationReport {
            schema: Some(entry.name.clone()),
            spec,
            outcome,
        })
    }

    /// Validate `document` against schema bytes supplied with the request.
    pub fn validate_inline(
        &self,
        request_path: &str,
        document: &[u8],
        schema: &[u8],
        spec: SpecVersion,
    ) -> Result<ValidationReport, ValidateError> {
        let schema: Value = serde_json::from_slice(schema).map_err(ValidateError::MalformedSchema)?;
        let document: Value = serde_json::from_slice(document).map_err(ValidateError::BadDocument)?;
        self.validate_inline_values(request_path, &document, &schema, spec)
    }

    /// [`validate_inline`](Self::validate_inline) for already-parsed values.
    pub fn validate_inline_values(
        &self,
        request_path: &str,
        document: &Value,
        schema: &Value,
        spec: SpecVersion,
    ) -> Result<ValidationReport, ValidateError> {
        let validator = self.compiler.compile(schema, spec)?;
        let outcome = validator.validate(document);
        self.stats.record(request_path, outcome.valid);
        tracing::debug!(
            path = request_path,
            spec = %spec,
            valid = outcome.valid,
            errors = outcome.errors.len(),
            "validated against inline schema"
        );

        Ok(ValidationReport {
            schema: None,
            spec,
            outcome,
        })
    }
}
