use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, repository::SeriesRepository};

/// Create the main application router with all API endpoints
pub fn create_router(repo: Arc<dyn SeriesRepository>) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Series endpoints
        .route("/api/data", get(handlers::get_series))
        .route("/api/data/entry", put(handlers::update_entry))
        .route("/api/data/category", post(handlers::add_category))
        .route("/api/data/category", delete(handlers::remove_category))
        .route("/api/data/month", post(handlers::append_month))
        .route("/api/data/reset", post(handlers::reset_series))
        // Add shared state
        .with_state(repo)
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
