//! # schemagate-schema: Compile/Validate Capability
//!
//! Wraps the `jsonschema` crate behind two small traits so the registry can
//! treat schema compilation as a black box:
//!
//! - [`SchemaCompiler`]: `compile(schema, spec) -> CompiledSchema | CompileError`
//! - [`CompiledSchema`]: `validate(document) -> ValidationOutcome`
//!
//! ## Crate Policy
//!
//! - Depends only on `schemagate-core` internally.
//! - Compilation never performs network or filesystem access.
//! - Validation is a pure function of the compiled schema and the document.

pub mod validate;

pub use validate::{
    CompileError, CompiledSchema, JsonSchemaCompiler, OfflineRetriever, SchemaCompiler,
    ValidationOutcome, Violation,
};
