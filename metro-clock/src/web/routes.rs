//! HTTP route handlers.

use axum::{Json, Router, extract::State, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::summary::Summary;

use super::state::AppState;
use super::templates::IndexTemplate;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/v1/summary", get(summary))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Dashboard shell.
async fn index_page(State(state): State<AppState>) -> IndexTemplate {
    IndexTemplate::from(&state.config.current().ui)
}

/// Everything the dashboard shows. Always 200; failures are listed in
/// `errors`.
async fn summary(State(state): State<AppState>) -> Json<Summary> {
    let config = state.config.reload().await;
    Json(state.aggregator.build_summary(&config).await)
}
