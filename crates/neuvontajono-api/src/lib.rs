//! HTTP server of the neuvontajono help queue

#![forbid(unsafe_code)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Clock};

use axum::Router;
use neuvontajono_core::Config;
use neuvontajono_core::context_error::Result;
use neuvontajono_database::QueueStore;
use std::sync::Arc;

/// Build the router with all routes over `store`
///
/// # Errors
///
/// Returns an error if the application state validation fails.
pub fn build_router(config: Config, store: Arc<dyn QueueStore>) -> Result<Router> {
    router_with_state(AppState::new(config, store))
}

/// Build the router over prepared state, e.g. with a fixed clock
///
/// # Errors
///
/// Returns an error if the application state validation fails.
pub fn router_with_state(state: AppState) -> Result<Router> {
    state.validate()?;
    Ok(routes::build_router().with_state(Arc::new(state)))
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use neuvontajono_database::InMemoryStore;

    #[test]
    fn test_router_builds_with_defaults() {
        assert!(build_router(Config::default(), Arc::new(InMemoryStore::new())).is_ok());
    }

    #[test]
    fn test_invalid_state_rejected() {
        let mut config = Config::default();
        config.statistics.yellow_limit = config.statistics.red_limit + 1;

        let error = build_router(config, Arc::new(InMemoryStore::new())).unwrap_err();
        assert!(error.step().contains("above red limit"));
    }
}
