use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::PreferenceStore,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::providers::{AnswerService, Catalog, TestingResultSource},
};

pub mod ask;
pub mod catalog;
pub mod preferences;
pub mod recommendations;
pub mod testing_results;

/// Collaborators shared by every handler
pub struct AppState {
    pub preferences: Arc<dyn PreferenceStore>,
    pub catalog: Arc<dyn Catalog>,
    pub testing_results: Arc<dyn TestingResultSource>,
    pub answer_service: Arc<dyn AnswerService>,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Catalog
        .route("/channels", get(catalog::channels))
        .route("/solutions", get(catalog::solutions))
        .route("/pubmed/publication-types", get(catalog::publication_types))
        .route("/favorites", get(catalog::favorites))
        // Preferences
        .route(
            "/preferences",
            get(preferences::get_preferences).post(preferences::replace_preferences),
        )
        .route("/preferences/toggle", post(preferences::toggle))
        .route("/preferences/pubmed-dates", post(preferences::set_pubmed_dates))
        // Recommendations
        .route("/recommendations/channels", get(recommendations::channels))
        // Testing results
        .route("/testing-results", get(testing_results::list))
        .route("/testing-results/objects", get(testing_results::objects))
        .route("/insights/testing-results", get(testing_results::insights))
        // Answering
        .route("/ask", post(ask::ask))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
