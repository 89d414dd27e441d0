//! # Schema Compilation & Validation
//!
//! The compile/validate capability the registry is built on. Two
//! operations, nothing else:
//!
//! - [`SchemaCompiler::compile`] turns a parsed schema document into an
//!   opaque, reusable [`CompiledSchema`] under a chosen [`SpecVersion`];
//! - [`CompiledSchema::validate`] checks one document and returns a fresh
//!   [`ValidationOutcome`].
//!
//! The production implementation, [`JsonSchemaCompiler`], is backed by the
//! `jsonschema` crate. The registry only ever talks to the traits, so tests
//! can substitute their own compiler.
//!
//! ## Trust Boundary
//!
//! Compiled schemas never reach the network. `$ref` URIs that are not
//! internal to the schema are refused at compile time by
//! [`OfflineRetriever`], which turns a remote reference into a
//! [`CompileError`] instead of an outbound request.

use std::fmt;
use std::sync::Arc;

use jsonschema::{Draft, Retrieve, Uri, Validator};
use schemagate_core::SpecVersion;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A schema failed to compile under the requested specification version.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("invalid schema ({spec}): {message}")]
pub struct CompileError {
    /// Version the compile was attempted under.
    pub spec: SpecVersion,
    /// JSON Pointer into the schema document where compilation failed.
    pub location: String,
    /// Diagnostic from the underlying compiler.
    pub message: String,
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer path within the schema that triggered the error.
    pub keyword_location: String,
    /// JSON Pointer path to the violating value in the document.
    pub instance_location: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// One-line `"<keywordLocation> <instanceLocation>"` rendering, both as
    /// URI fragments.
    pub fn basic_line(&self) -> String {
        format!("#{} #{}", self.keyword_location, self.instance_location)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_location.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_location, self.message)
        }
    }
}

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// Whether the document satisfied the schema.
    pub valid: bool,
    /// Violations in the order the validator reported them. Empty when valid.
    pub errors: Vec<Violation>,
}

impl ValidationOutcome {
    /// Build an outcome from a list of violations.
    pub fn from_violations(errors: Vec<Violation>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// A compiled schema, ready to validate any number of documents.
pub trait CompiledSchema: Send + Sync + fmt::Debug {
    /// Validate `document`, collecting every violation.
    fn validate(&self, document: &Value) -> ValidationOutcome;

    /// Version this schema was compiled under.
    fn spec(&self) -> SpecVersion;
}

/// Compiles schema documents into [`CompiledSchema`] objects.
pub trait SchemaCompiler: Send + Sync + fmt::Debug {
    /// Compile `schema` under `spec`.
    fn compile(
        &self,
        schema: &Value,
        spec: SpecVersion,
    ) -> Result<Arc<dyn CompiledSchema>, CompileError>;
}

/// Retriever that refuses every external `$ref`.
///
/// Installed on every compile so the `jsonschema` crate never performs a
/// network or filesystem fetch on behalf of a stored or inline schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!(
            "external reference '{}' is not resolved; schemas must be self-contained",
            uri.as_str()
        )
        .into())
    }
}

/// [`SchemaCompiler`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaCompiler;

impl JsonSchemaCompiler {
    /// Create a compiler.
    pub fn new() -> Self {
        Self
    }
}

fn draft_for(spec: SpecVersion) -> Draft {
    match spec {
        SpecVersion::Draft4 => Draft::Draft4,
        SpecVersion::Draft6 => Draft::Draft6,
        SpecVersion::Draft7 => Draft::Draft7,
        SpecVersion::Draft2019 => Draft::Draft201909,
        SpecVersion::Draft2020 => Draft::Draft202012,
    }
}

impl SchemaCompiler for JsonSchemaCompiler {
    fn compile(
        &self,
        schema: &Value,
        spec: SpecVersion,
    ) -> Result<Arc<dyn CompiledSchema>, CompileError> {
        let validator = jsonschema::options()
            .with_draft(draft_for(spec))
            .with_retriever(OfflineRetriever)
            .build(schema)
            .map_err(|e| CompileError {
                spec,
                location: e.instance_path.to_string(),
                message: e.to_string(),
            })?;

        Ok(Arc::new(JsonSchemaValidator {
            inner: validator,
            spec,
        }))
    }
}

/// Compiled `jsonschema` validator.
pub struct JsonSchemaValidator {
    inner: Validator,
    spec: SpecVersion,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema for JsonSchemaValidator {
    fn validate(&self, document: &Value) -> ValidationOutcome {
        let errors = self
            .inner
            .iter_errors(document)
            .map(|e| Violation {
                keyword_location: e.schema_path.to_string(),
                instance_location: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        ValidationOutcome::from_violations(errors)
    }

    fn spec(&self) -> SpecVersion {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> Value {
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "integer", "minimum": 0 }
            }
        })
    }

    #[test]
    fn compiles_and_accepts_valid_document() {
        let compiled = JsonSchemaCompiler::new()
            .compile(&person_schema(), SpecVersion::Draft7)
            .unwrap();
        let outcome = compiled.validate(&json!({"name": "Ann"}));
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
        assert_eq!(compiled.spec(), SpecVersion::Draft7);
    }

    #[test]
    fn reports_missing_required_property() {
        let compiled = JsonSchemaCompiler::new()
            .compile(&person_schema(), SpecVersion::Draft7)
            .unwrap();
        let outcome = compiled.validate(&json!({}));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.len(), 1);
        let v = &outcome.errors[0];
        assert_eq!(v.keyword_location, "/required");
        assert_eq!(v.instance_location, "");
        assert!(v.message.contains("name"), "got: {}", v.message);
    }

    #[test]
    fn collects_every_violation_in_order() {
        let compiled = JsonSchemaCompiler::new()
            .compile(&person_schema(), SpecVersion::Draft2020)
            .unwrap();
        let outcome = compiled.validate(&json!({"name": 7, "age": -1}));
        assert!(!outcome.valid);
        let locations: Vec<&str> = outcome
            .errors
            .iter()
            .map(|v| v.instance_location.as_str())
            .collect();
        assert!(locations.contains(&"/name"), "got: {locations:?}");
        assert!(locations.contains(&"/age"), "got: {locations:?}");
    }

    #[test]
    fn rejects_schema_with_invalid_keyword_value() {
        let err = JsonSchemaCompiler::new()
            .compile(&json!({"type": 12}), SpecVersion::Draft7)
            .unwrap_err();
        assert_eq!(err.spec, SpecVersion::Draft7);
        assert!(err.to_string().starts_with("invalid schema (draft7)"));
    }

    #[test]
    fn refuses_external_references() {
        let schema = json!({"$ref": "https://example.com/remote.json"});
        let result = JsonSchemaCompiler::new().compile(&schema, SpecVersion::Draft7);
        assert!(result.is_err(), "remote $ref must not compile");
    }

    #[test]
    fn resolves_internal_references() {
        let schema = json!({
            "definitions": { "name": { "type": "string" } },
            "properties": { "name": { "$ref": "#/definitions/name" } }
        });
        let compiled = JsonSchemaCompiler::new()
            .compile(&schema, SpecVersion::Draft7)
            .unwrap();
        assert!(compiled.validate(&json!({"name": "x"})).valid);
        assert!(!compiled.validate(&json!({"name": 1})).valid);
    }

    #[test]
    fn basic_line_uses_fragments() {
        let v = Violation {
            keyword_location: "/required".to_string(),
            instance_location: String::new(),
            message: "\"name\" is a required property".to_string(),
        };
        assert_eq!(v.basic_line(), "#/required #");
        assert!(v.to_string().contains("(root)"));
    }

    #[test]
    fn violation_display_uses_instance_path() {
        let v = Violation {
            keyword_location: "/properties/age/minimum".to_string(),
            instance_location: "/age".to_string(),
            message: "-1 is less than the minimum of 0".to_string(),
        };
        assert_eq!(v.to_string(), "/age: -1 is less than the minimum of 0");
    }
}
