use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::error;

use super::criteria::SearchRequest;
use super::repository::{CandidateRepository, RepositoryError};
use super::service::{MunicipalitySearchService, SearchServiceError};

/// Router builder exposing the search and catalogue endpoints.
pub fn search_router<R>(service: Arc<MunicipalitySearchService<R>>) -> Router
where
    R: CandidateRepository + 'static,
{
    Router::new()
        .route("/api/v1/search", post(search_handler::<R>))
        .route("/api/v1/municipalities", get(list_handler::<R>))
        .route("/api/v1/municipalities/regions", get(regions_handler::<R>))
        .route("/api/v1/municipalities/:code", get(detail_handler::<R>))
        .with_state(service)
}

pub(crate) async fn search_handler<R>(
    State(service): State<Arc<MunicipalitySearchService<R>>>,
    axum::Json(request): axum::Json<SearchRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    // Routing calls and the throttle block, so the search runs off the async workers.
    let outcome = tokio::task::spawn_blocking(move || service.search(&request))
        .await
        .unwrap_or_else(|join_error| Err(SearchServiceError::Worker(join_error.to_string())));

    match outcome {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(other) => {
            error!(error = %other, "search failed");
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<MunicipalitySearchService<R>>>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.municipalities() {
        Ok(candidates) => (StatusCode::OK, axum::Json(candidates)).into_response(),
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn regions_handler<R>(
    State(service): State<Arc<MunicipalitySearchService<R>>>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.regions() {
        Ok(regions) => (StatusCode::OK, axum::Json(regions)).into_response(),
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<MunicipalitySearchService<R>>>,
    Path(code): Path<String>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.municipality(&code) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(SearchServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "municipality not found",
                "code": code,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
