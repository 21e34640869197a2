//! Route definitions

use crate::{handlers, state::AppState};
use axum::{
    Router,
    routing::get,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

/// Queue and statistics pages of a course
pub fn course_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/course/:course_id/queue",
            get(handlers::queue::queue_page).post(handlers::queue::post_queue),
        )
        .route(
            "/course/:course_id/queue/summary",
            get(handlers::queue::get_summary),
        )
        .route(
            "/course/:course_id/statistics",
            get(handlers::statistics::statistics_page).post(handlers::statistics::post_search),
        )
        .layer(CompressionLayer::new())
}

/// Health check routes (no authentication required)
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
}

/// Build the complete router
pub fn build_router() -> Router<Arc<AppState>> {
    Router::new().merge(course_routes()).merge(health_routes())
}
