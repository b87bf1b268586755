use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::api::types::*;
use crate::error::VanceError;

use super::router::AppState;

/// Error wrapper for API handlers
pub enum ApiError {
    Vance(VanceError),
    BadRequest(String),
}

impl From<VanceError> for ApiError {
    fn from(e: VanceError) -> Self {
        ApiError::Vance(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Vance(e) => {
                let (status, error_type) = match &e {
                    VanceError::EmptyQuery => (StatusCode::BAD_REQUEST, "empty_query"),
                    VanceError::QueryParse(_) => (StatusCode::BAD_REQUEST, "query_parse_error"),
                    VanceError::FrontMatter(_) => (StatusCode::BAD_REQUEST, "front_matter_error"),
                    VanceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
                    VanceError::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "document_not_found"),
                    VanceError::WriterBusy => (StatusCode::CONFLICT, "writer_busy"),
                    VanceError::SchemaMismatch { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "schema_mismatch")
                    }
                    VanceError::CommitFailed(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "commit_failed")
                    }
                    VanceError::Repository(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "repository_error")
                    }
                    VanceError::Serialization(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error")
                    }
                    VanceError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
                    VanceError::Corrupted(_) => (StatusCode::INTERNAL_SERVER_ERROR, "corrupted_index"),
                    VanceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
                };
                if status.is_server_error() {
                    error!(error = %e, "request failed");
                }
                (status, error_type, e.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
        };

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

/// Run an engine call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VanceError::Internal(format!("blocking task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Ranked search with highlights and a spelling suggestion
pub async fn search(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let Some(query) = non_blank(req.query) else {
        warn!("search: empty query");
        return Err(ApiError::BadRequest("missing 'query'".to_string()));
    };

    let service = Arc::clone(&state.service);
    let response = blocking(move || service.search(&query)).await?;

    Ok(Json(SearchBody {
        status: STATUS_OK.to_string(),
        results: response.results,
        suggestion: response.suggestion,
    }))
}

/// Titles whose name contains the given substring
pub async fn find(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FindRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    // An empty name is logged but still looked up, which matches nothing
    let name = non_blank(req.name).unwrap_or_else(|| {
        warn!("find: empty name");
        String::new()
    });

    let service = Arc::clone(&state.service);
    let results = blocking(move || service.find_by_name(&name)).await?;

    Ok(Json(FindBody {
        status: STATUS_OK.to_string(),
        results,
    }))
}

/// Stored document metadata by path
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let Some(path) = non_blank(req.path) else {
        return Err(ApiError::BadRequest("missing 'path'".to_string()));
    };

    let service = Arc::clone(&state.service);
    let doc = blocking(move || service.get(&path)).await?;

    Ok(Json(GetBody {
        status: STATUS_OK.to_string(),
        document: DocumentInfo {
            id: doc.title,
            lang: doc.lang,
        },
    }))
}

/// Read a page from the repository and index it
pub async fn add(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let Some(name) = non_blank(req.name) else {
        warn!("add: missing 'name'");
        return Err(ApiError::BadRequest("missing 'name'".to_string()));
    };
    let lang = non_blank(req.lang);

    let service = Arc::clone(&state.service);
    blocking(move || service.add(&name, lang.as_deref())).await?;

    Ok(Json(StatusBody::ok()))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        documents: state.service.index().doc_count(),
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .service
        .metrics()
        .encode()
        .map_err(|e| VanceError::Internal(format!("failed to encode metrics: {}", e)))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
