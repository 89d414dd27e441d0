//! # Specification Versions
//!
//! The JSON Schema dialect a schema is compiled under. Tokens follow the
//! names operators already use on the command line and in query strings
//! (`draft4` … `draft2020`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpecVersionError;

/// JSON Schema draft used to interpret a schema's keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecVersion {
    /// Draft 4.
    Draft4,
    /// Draft 6.
    Draft6,
    /// Draft 7.
    #[default]
    Draft7,
    /// Draft 2019-09.
    Draft2019,
    /// Draft 2020-12.
    Draft2020,
}

impl SpecVersion {
    /// Every supported version, oldest first.
    pub const ALL: [SpecVersion; 5] = [
        Self::Draft4,
        Self::Draft6,
        Self::Draft7,
        Self::Draft2019,
        Self::Draft2020,
    ];

    /// Return the token for this version.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft4 => "draft4",
            Self::Draft6 => "draft6",
            Self::Draft7 => "draft7",
            Self::Draft2019 => "draft2019",
            Self::Draft2020 => "draft2020",
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = SpecVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| SpecVersionError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_draft7() {
        assert_eq!(SpecVersion::default(), SpecVersion::Draft7);
    }

    #[test]
    fn parse_all_tokens() {
        for v in SpecVersion::ALL {
            assert_eq!(v.as_str().parse::<SpecVersion>().unwrap(), v);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "draft3".parse::<SpecVersion>().unwrap_err();
        assert_eq!(err.to_string(), "invalid spec: draft3");
        assert!("Draft7".parse::<SpecVersion>().is_err());
    }

    #[test]
    fn serde_uses_tokens() {
        let json = serde_json::to_string(&SpecVersion::Draft2019).unwrap();
        assert_eq!(json, "\"draft2019\"");
        let back: SpecVersion = serde_json::from_str("\"draft2020\"").unwrap();
        assert_eq!(back, SpecVersion::Draft2020);
    }
}
