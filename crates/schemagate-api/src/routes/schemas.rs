//! # Schema Management Endpoints
//!
//! - `GET /schema/{schema}`: the stored schema file, byte for byte.
//! - `POST /schema/{schema}`: upload or replace a schema. Requires
//!   `--allow-save-uploads`.
//! - `GET /schemas`: names of every loaded schema.
//!
//! An upload is checked in this order: uploads enabled, declared
//! `Content-Length`, then the body is read with a hard cap and handed to
//! the ingestion pipeline, which compiles before it writes anything.

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use schemagate_core::{SchemaName, SpecVersion};
use schemagate_registry::IngestRequest;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody};
use crate::extractors::extract_query;
use crate::state::AppState;

pub const UPLOADED: &str = "Schema uploaded and validated successfully";

/// Query parameters for uploads.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UploadParams {
    /// Version to compile the schema under; defaults to `--default-spec`.
    #[param(value_type = Option<String>, example = "draft7")]
    pub spec: Option<SpecVersion>,
}

/// Query parameters for the schema list.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListParams {
    /// `json` for a JSON array; anything else returns one name per line.
    pub format: Option<String>,
}

/// Successful upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub result: String,
    /// Stored name, with `.json` appended if it was missing.
    pub schema: String,
    /// Version the schema was compiled under.
    pub spec: String,
}

/// Build the schema management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schema/{schema}", get(get_schema).post(upload_schema))
        .route("/schemas", get(list_schemas))
}

/// GET /schema/{schema}: Retrieve a stored schema.
#[utoipa::path(
    get,
    path = "/schema/{schema}",
    params(("schema" = String, Path, description = "Schema name; `.json` is appended if missing")),
    responses(
        (status = 200, description = "Schema file contents", content_type = "application/json"),
        (status = 404, description = "Schema not loaded", body = ErrorBody),
        (status = 500, description = "Schema file could not be read", body = ErrorBody),
    ),
    tag = "schemas"
)]
async fn get_schema(
    State(state): State<AppState>,
    Path(schema): Path<String>,
) -> Result<Response, AppError> {
    let name = SchemaName::parse(&schema).map_err(|_| AppError::NotFound(schema.clone()))?;
    if !state.store.contains(&name) {
        return Err(AppError::NotFound(name.to_string()));
    }

    let path = name
        .resolve_in(state.pipeline.schema_dir())
        .map_err(|_| AppError::NotFound(name.to_string()))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read {}: {e}", path.display())))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

/// POST /schema/{schema}: Upload or replace a schema.
#[utoipa::path(
    post,
    path = "/schema/{schema}",
    params(
        ("schema" = String, Path, description = "Schema name; `.json` is appended if missing"),
        UploadParams,
    ),
    request_body(content = Object, description = "JSON schema document"),
    responses(
        (status = 200, description = "Schema compiled, saved and loaded", body = UploadResponse),
        (status = 400, description = "Unsafe name, malformed JSON, or schema does not compile", body = ErrorBody),
        (status = 403, description = "Uploads are disabled", body = ErrorBody),
        (status = 413, description = "Schema exceeds the upload limit", body = ErrorBody),
        (status = 500, description = "Schema could not be saved", body = ErrorBody),
    ),
    tag = "schemas"
)]
async fn upload_schema(
    State(state): State<AppState>,
    Path(schema): Path<String>,
    query: Result<Query<UploadParams>, QueryRejection>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, AppError> {
    if !state.config.allow_save_uploads {
        return Err(AppError::Forbidden("schema uploads are disabled".to_string()));
    }

    let limit = state.pipeline.max_upload_bytes();
    let too_large = || {
        AppError::PayloadTooLarge(format!("uploaded schema exceeds the {limit}-byte limit"))
    };
    // Checked before the name and query so an oversized body is refused
    // without being read, whatever it is addressed to.
    if declared_length(&headers).is_some_and(|len| len > limit as u64) {
        return Err(too_large());
    }

    let params = extract_query(query)?;
    let spec = params.spec.unwrap_or(state.config.default_spec);

    // Undeclared or understated lengths are caught by the capped read.
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| too_large())?;

    let pipeline = state.pipeline.clone();
    let entry = tokio::task::spawn_blocking(move || {
        pipeline.ingest(IngestRequest::upload(&schema, &bytes, spec))
    })
    .await
    .map_err(|e| AppError::Internal(format!("upload task failed: {e}")))??;

    Ok(Json(UploadResponse {
        result: UPLOADED.to_string(),
        schema: entry.name.to_string(),
        spec: entry.spec.to_string(),
    }))
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// GET /schemas: List loaded schemas.
#[utoipa::path(
    get,
    path = "/schemas",
    params(ListParams),
    responses(
        (status = 200, description = "Schema names, sorted", body = Vec<String>),
    ),
    tag = "schemas"
)]
async fn list_schemas(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let params = extract_query(query)?;
    let names: Vec<String> = state.store.names().iter().map(|n| n.to_string()).collect();

    if params.format.as_deref() == Some("json") {
        return Ok(Json(names).into_response());
    }

    let mut text = String::new();
    for name in &names {
        text.push_str(name);
        text.push('\n');
    }
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
}
