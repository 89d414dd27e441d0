//! # Validation Endpoints
//!
//! - `POST /validate/{schema}`: validate the body against a stored schema.
//! - `POST /validatewithschema`: validate `data` against the `schema`
//!   supplied in the same body; nothing is stored.
//!
//! Statistics are keyed by the request path exactly as received, so
//! `/validate/person` and `/validate/person.json` are counted separately.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use schemagate_core::SpecVersion;
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_query, parse_json};
use crate::output::{self, OutputLevel, ValidationResponse};
use crate::state::AppState;

/// Query parameters accepted by both validation endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ValidateParams {
    /// Schema version; for stored schemas, recompiles under this version
    /// for this request only.
    #[param(value_type = Option<String>, example = "draft2020")]
    pub spec: Option<SpecVersion>,
    /// Response detail: `flag`, `basic`, `detailed` or `verbose`.
    pub outputlevel: Option<OutputLevel>,
}

/// Body of `POST /validatewithschema`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InlineValidationRequest {
    /// Document to validate.
    #[serde(default)]
    pub data: Value,
    /// Schema to validate against.
    pub schema: Value,
}

/// Build the validation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate/{schema}", post(validate_by_name))
        .route("/validatewithschema", post(validate_with_schema))
}

/// POST /validate/{schema}: Validate a document against a stored schema.
#[utoipa::path(
    post,
    path = "/validate/{schema}",
    params(
        ("schema" = String, Path, description = "Schema name; `.json` is appended if missing"),
        ValidateParams,
    ),
    request_body(content = Object, description = "Document to validate"),
    responses(
        (status = 200, description = "Validation passed", body = ValidationResponse),
        (status = 400, description = "Validation failed, or the body is not JSON", body = ValidationResponse),
        (status = 404, description = "Schema not loaded", body = ErrorBody),
    ),
    tag = "validation"
)]
async fn validate_by_name(
    State(state): State<AppState>,
    Path(schema): Path<String>,
    uri: Uri,
    query: Result<Query<ValidateParams>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<ValidationResponse>), AppError> {
    let params = extract_query(query)?;
    let level = params
        .outputlevel
        .unwrap_or(state.config.default_output_level);

    let report = state
        .orchestrator
        .validate_by_name(uri.path(), &schema, &body, params.spec)?;

    let (status, response) = output::render(&report, level);
    Ok((status, Json(response)))
}

/// POST /validatewithschema: Validate a document against an inline schema.
#[utoipa::path(
    post,
    path = "/validatewithschema",
    params(ValidateParams),
    request_body = InlineValidationRequest,
    responses(
        (status = 200, description = "Validation passed", body = ValidationResponse),
        (status = 400, description = "Validation failed, invalid schema, or malformed body", body = ValidationResponse),
    ),
    tag = "validation"
)]
async fn validate_with_schema(
    State(state): State<AppState>,
    uri: Uri,
    query: Result<Query<ValidateParams>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<ValidationResponse>), AppError> {
    let params = extract_query(query)?;
    let level = params
        .outputlevel
        .unwrap_or(state.config.default_output_level);
    let spec = params.spec.unwrap_or(state.config.default_spec);

    let request: InlineValidationRequest = parse_json(&body)?;
    let report = state.orchestrator.validate_inline_values(
        uri.path(),
        &request.data,
        &request.schema,
        spec,
    )?;

    let (status, response) = output::render(&report, level);
    Ok((status, Json(response)))
}
