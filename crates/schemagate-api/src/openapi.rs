//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "schemagate",
        description = "Validate JSON documents against stored or inline JSON schemas.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::validate::validate_by_name,
        crate::routes::validate::validate_with_schema,
        crate::routes::schemas::get_schema,
        crate::routes::schemas::upload_schema,
        crate::routes::schemas::list_schemas,
        crate::routes::stats::get_stats,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::output::OutputLevel,
        crate::output::DetailedError,
        crate::output::ErrorList,
        crate::output::ValidationResponse,
        crate::routes::validate::InlineValidationRequest,
        crate::routes::schemas::UploadResponse,
        crate::routes::stats::PathStatsBody,
    )),
    tags(
        (name = "validation", description = "Validate documents"),
        (name = "schemas", description = "Manage stored schemas"),
        (name = "stats", description = "Validation statistics"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&str> = spec.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/validate/{schema}",
            "/validatewithschema",
            "/schema/{schema}",
            "/schemas",
            "/stats",
        ] {
            assert!(paths.contains(&expected), "missing {expected}: {paths:?}");
        }
    }

    #[test]
    fn spec_serializes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("ValidationResponse"));
    }
}
