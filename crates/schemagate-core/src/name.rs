//! # Schema Names
//!
//! A [`SchemaName`] is the registry key for a schema and, at the same time,
//! the file name under which its bytes live in the schema directory. The
//! two roles are tied together on purpose: a name that parses can always be
//! joined onto the schema directory without leaving it.
//!
//! ## Rules
//!
//! - Only ASCII letters, digits, `-`, `_` and `.` are accepted.
//! - The name may not start with `.` and may not contain `..`.
//! - The canonical extension [`SCHEMA_EXTENSION`] is appended when missing.
//! - The full name is at most [`MAX_NAME_LEN`] bytes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SchemaNameError;

/// Extension every stored schema carries.
pub const SCHEMA_EXTENSION: &str = ".json";

/// Maximum length of a schema name, extension included.
pub const MAX_NAME_LEN: usize = 255;

/// Validated schema file name, e.g. `person.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaName(String);

impl SchemaName {
    /// Parse a caller-supplied name, appending `.json` if it is missing.
    pub fn parse(raw: &str) -> Result<Self, SchemaNameError> {
        let name = if raw.ends_with(SCHEMA_EXTENSION) {
            raw.to_string()
        } else {
            format!("{raw}{SCHEMA_EXTENSION}")
        };

        let stem = &name[..name.len() - SCHEMA_EXTENSION.len()];
        if stem.is_empty() {
            return Err(SchemaNameError::Empty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(SchemaNameError::TooLong {
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        if let Some(ch) = name.chars().find(|c| !is_allowed(*c)) {
            return Err(SchemaNameError::IllegalCharacter { name, ch });
        }
        if name.starts_with('.') || name.contains("..") {
            return Err(SchemaNameError::Traversal(name));
        }

        Ok(Self(name))
    }

    /// Derive the schema name from a path's final component.
    ///
    /// Returns `None` for paths without a UTF-8 file name or without the
    /// canonical extension; such files are never schemas.
    pub fn from_path(path: &Path) -> Option<Result<Self, SchemaNameError>> {
        let file_name = path.file_name()?.to_str()?;
        if !file_name.ends_with(SCHEMA_EXTENSION) {
            return None;
        }
        Some(Self::parse(file_name))
    }

    /// Resolve this name inside `dir`.
    ///
    /// The result is always a direct child of `dir`; the check is repeated
    /// here so a future relaxation of the allow-list cannot silently open a
    /// traversal.
    pub fn resolve_in(&self, dir: &Path) -> Result<PathBuf, SchemaNameError> {
        let path = dir.join(&self.0);
        match path.parent() {
            Some(parent) if parent == dir => Ok(path),
            _ => Err(SchemaNameError::Traversal(self.0.clone())),
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SchemaName {
    type Error = SchemaNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaName> for String {
    fn from(name: SchemaName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_extension() {
        let name = SchemaName::parse("person").unwrap();
        assert_eq!(name.as_str(), "person.json");
    }

    #[test]
    fn keeps_existing_extension() {
        let name = SchemaName::parse("person.json").unwrap();
        assert_eq!(name.as_str(), "person.json");
    }

    #[test]
    fn accepts_dots_dashes_underscores() {
        assert!(SchemaName::parse("order-v2_final.schema.json").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(SchemaName::parse(""), Err(SchemaNameError::Empty));
        assert_eq!(SchemaName::parse(".json"), Err(SchemaNameError::Empty));
    }

    #[test]
    fn rejects_path_separators() {
        let err = SchemaName::parse("../etc/passwd").unwrap_err();
        assert!(matches!(err, SchemaNameError::IllegalCharacter { ch: '/', .. }));
        let err = SchemaName::parse("a\\b.json").unwrap_err();
        assert!(matches!(err, SchemaNameError::IllegalCharacter { ch: '\\', .. }));
    }

    #[test]
    fn rejects_parent_sequences_and_hidden_files() {
        assert!(matches!(
            SchemaName::parse("..json"),
            Err(SchemaNameError::Traversal(_))
        ));
        assert!(matches!(
            SchemaName::parse(".hidden.json"),
            Err(SchemaNameError::Traversal(_))
        ));
        assert!(matches!(
            SchemaName::parse("a..b.json"),
            Err(SchemaNameError::Traversal(_))
        ));
    }

    #[test]
    fn rejects_whitespace_and_unicode() {
        assert!(SchemaName::parse("my schema.json").is_err());
        assert!(SchemaName::parse("sch\u{e9}ma.json").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        let raw = "a".repeat(MAX_NAME_LEN);
        let err = SchemaName::parse(&raw).unwrap_err();
        assert!(matches!(err, SchemaNameError::TooLong { .. }));
    }

    #[test]
    fn resolves_as_direct_child() {
        let dir = Path::new("/srv/schemas");
        let name = SchemaName::parse("person").unwrap();
        assert_eq!(
            name.resolve_in(dir).unwrap(),
            PathBuf::from("/srv/schemas/person.json")
        );
    }

    #[test]
    fn from_path_skips_other_extensions() {
        assert!(SchemaName::from_path(Path::new("/x/notes.txt")).is_none());
        assert!(SchemaName::from_path(Path::new("/x/.p.json.1234.tmp")).is_none());
        let name = SchemaName::from_path(Path::new("/x/person.json"))
            .unwrap()
            .unwrap();
        assert_eq!(name.as_str(), "person.json");
    }

    #[test]
    fn serde_rejects_invalid_names() {
        let ok: SchemaName = serde_json::from_str("\"person\"").unwrap();
        assert_eq!(ok.as_str(), "person.json");
        assert!(serde_json::from_str::<SchemaName>("\"../x\"").is_err());
    }
}
