//! Health check endpoints for monitoring

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Timestamp of the check
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Store connectivity status
    pub store: StoreHealth,
    /// Process uptime in seconds
    pub uptime_seconds: u64,
}

/// Store health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHealth {
    /// Whether the store answered
    pub connected: bool,
    /// `memory` or `postgres`
    pub backend: String,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Readiness check response (simpler than health)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Service readiness status
    pub ready: bool,
    /// Timestamp of the check
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Basic health check endpoint for load balancers and monitoring
///
/// Returns HTTP 200 with health details, or HTTP 503 if the store cannot be reached.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2024-09-02T10:15:00Z",
///   "store": { "connected": true, "backend": "postgres", "response_time_ms": 3 },
///   "uptime_seconds": 3600
/// }
/// ```
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let start_time = std::time::Instant::now();

    if let Err(e) = state.store.health_check().await {
        error!("Store health check failed: {}", e);
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let response_time_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
    let backend = if state.config.database.is_in_memory() {
        "memory"
    } else {
        "postgres"
    };

    info!("Health check completed in {}ms", response_time_ms);
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        store: StoreHealth {
            connected: true,
            backend: backend.to_string(),
            response_time_ms,
        },
        uptime_seconds: get_uptime_seconds(),
    }))
}

/// Readiness check endpoint for Kubernetes-style probes
///
/// Returns 200 OK if the service is ready to accept traffic
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    match state.store.health_check().await {
        Ok(()) => Ok(Json(ReadinessResponse {
            ready: true,
            timestamp: chrono::Utc::now(),
        })),
        Err(e) => {
            error!("Readiness check failed - store not accessible: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Process uptime in seconds, counted from the first call
pub fn get_uptime_seconds() -> u64 {
    static START_TIME: std::sync::LazyLock<std::time::Instant> =
        std::sync::LazyLock::new(std::time::Instant::now);
    START_TIME.elapsed().as_secs()
}
