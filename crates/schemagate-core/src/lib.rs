//! # schemagate-core: Foundational Types
//!
//! Domain primitives shared by every other crate in the workspace. It
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A schema is addressed by a
//!    [`SchemaName`], never a bare string. Parsing enforces the file-name
//!    allow-list once, at the boundary, so the registry and the persistence
//!    layer can trust every name they see.
//!
//! 2. **Single [`SpecVersion`] enum.** One definition of the supported
//!    JSON Schema drafts, exhaustive `match` everywhere.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `schemagate-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod name;
pub mod spec;

pub use error::{SchemaNameError, SpecVersionError};
pub use name::{SchemaName, MAX_NAME_LEN, SCHEMA_EXTENSION};
pub use spec::SpecVersion;
