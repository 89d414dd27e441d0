//! # Custom Extractors
//!
//! Helpers that turn axum extractor rejections into [`AppError`] so every
//! malformed request gets the structured error envelope instead of axum's
//! plain-text rejection.

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Extract query parameters, mapping deserialization errors to
/// [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(query: Result<Query<T>, QueryRejection>) -> Result<..., AppError> {
///     let params = extract_query(query)?;
/// }
/// ```
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a request body as JSON regardless of its `Content-Type`.
///
/// Clients commonly post schemas and documents with `curl -d`, which sends
/// a form content type; the body is still judged purely on its bytes.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON: {e}")))
}
