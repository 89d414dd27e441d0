//! # Error Types
//!
//! Errors raised while constructing the domain primitives in this crate.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. Higher layers wrap these rather than stringifying them,
//! so callers can still match on the precise rejection reason.

use thiserror::Error;

/// Why a requested schema name was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaNameError {
    /// The name (without extension) is empty.
    #[error("schema name must not be empty")]
    Empty,

    /// The name exceeds the maximum file-name length.
    #[error("schema name exceeds {max} bytes (got {len})")]
    TooLong {
        /// Length of the rejected name in bytes.
        len: usize,
        /// Maximum permitted length.
        max: usize,
    },

    /// The name contains a character outside the allow-list.
    #[error("unsafe filename: character {ch:?} is not allowed in '{name}'")]
    IllegalCharacter {
        /// The rejected name.
        name: String,
        /// The first offending character.
        ch: char,
    },

    /// The name contains a parent-directory sequence or is a hidden file.
    #[error("invalid file path: '{0}' would escape the schema directory")]
    Traversal(String),
}

/// An unrecognised specification-version token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid spec: {0}")]
pub struct SpecVersionError(pub String);
