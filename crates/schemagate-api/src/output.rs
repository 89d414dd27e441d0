//! # Validation Response Rendering
//!
//! Shapes a [`ValidationReport`] into the JSON body returned by the
//! validation endpoints. How much detail a failure carries is chosen per
//! request with `?outputlevel=`, falling back to the configured default.

use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use schemagate_registry::ValidationReport;
use schemagate_schema::Violation;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const PASSED: &str = "Validation passed";
pub const FAILED: &str = "Validation failed";

/// Amount of detail in a validation response.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    /// Only the pass/fail result.
    Flag,
    /// One `"#<keywordLocation> #<instanceLocation>"` line per violation.
    #[default]
    Basic,
    /// Structured violations with their messages.
    Detailed,
    /// Structured violations plus the schema name and version used.
    Verbose,
}

impl OutputLevel {
    pub const ALL: [OutputLevel; 4] = [Self::Flag, Self::Basic, Self::Detailed, Self::Verbose];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Basic => "basic",
            Self::Detailed => "detailed",
            Self::Verbose => "verbose",
        }
    }
}

impl fmt::Display for OutputLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                format!("invalid output level: {s} (valid values: basic, flag, detailed, verbose)")
            })
    }
}

/// A violation as rendered at the `detailed` and `verbose` levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedError {
    pub keyword_location: String,
    pub instance_location: String,
    pub error: String,
}

impl From<&Violation> for DetailedError {
    fn from(v: &Violation) -> Self {
        Self {
            keyword_location: format!("#{}", v.keyword_location),
            instance_location: format!("#{}", v.instance_location),
            error: v.message.clone(),
        }
    }
}

/// Violations in the shape chosen by the output level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorList {
    Basic(Vec<String>),
    Detailed(Vec<DetailedError>),
}

/// Body of every validation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationResponse {
    /// `"Validation passed"` or `"Validation failed"`.
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorList>,
    /// Stored schema name (`verbose` only, absent for inline schemas).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Schema version used (`verbose` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
}

/// Render `report` at `level`, with the status code to send it under.
///
/// A failed validation is a client error: the document was rejected.
pub fn render(report: &ValidationReport, level: OutputLevel) -> (StatusCode, ValidationResponse) {
    let outcome = &report.outcome;
    let (status, result) = if outcome.valid {
        (StatusCode::OK, PASSED)
    } else {
        (StatusCode::BAD_REQUEST, FAILED)
    };

    let errors = match level {
        _ if outcome.valid => None,
        OutputLevel::Flag => None,
        OutputLevel::Basic => Some(ErrorList::Basic(
            outcome.errors.iter().map(Violation::basic_line).collect(),
        )),
        OutputLevel::Detailed | OutputLevel::Verbose => Some(ErrorList::Detailed(
            outcome.errors.iter().map(DetailedError::from).collect(),
        )),
    };

    let (schema, spec) = if level == OutputLevel::Verbose {
        (
            report.schema.as_ref().map(|name| name.to_string()),
            Some(report.spec.to_string()),
        )
    } else {
        (None, None)
    };

    (
        status,
        ValidationResponse {
            result: result.to_string(),
            errors,
            schema,
            spec,
        },
    )
}
