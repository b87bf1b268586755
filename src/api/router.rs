use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::SearchService;

use super::handlers::*;

/// Application state shared across all handlers
pub struct AppState {
    pub service: Arc<SearchService>,
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/search", post(search))
        .route("/api/find", post(find))
        .route("/api/get", post(get_document))
        .route("/api/add", post(add))
        // Health and metrics
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
