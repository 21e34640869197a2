//! Application state management

use chrono::{Local, NaiveDateTime};
use neuvontajono_core::{
    Config,
    context_error::{ContextError, Result},
};
use neuvontajono_database::QueueStore;
use std::{fmt, sync::Arc};

/// Source of the local wall-clock time used for session windows
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Queue storage
    pub store: Arc<dyn QueueStore>,
    clock: Clock,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state reading the system clock
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn QueueStore>) -> Self {
        Self {
            config,
            store,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current local time
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// Check if the application is properly configured
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<()> {
        let statistics = &self.config.statistics;
        if statistics.yellow_limit > statistics.red_limit {
            return Err(ContextError::new(format!(
                "Yellow limit {} is above red limit {}",
                statistics.yellow_limit, statistics.red_limit
            )));
        }
        if statistics.most_frequent_limit < 0 {
            return Err(ContextError::new(format!(
                "Most frequent limit must not be negative: {}",
                statistics.most_frequent_limit
            )));
        }
        if self.config.auth.user_header.trim().is_empty() {
            return Err(ContextError::new("User header name is empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use neuvontajono_database::InMemoryStore;
    use pretty_assertions::assert_eq;

    fn state(config: Config) -> AppState {
        AppState::new(config, Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(state(Config::default()).validate().is_ok());
    }

    #[test]
    fn test_inverted_limits_rejected() {
        let mut config = Config::default();
        config.statistics.yellow_limit = 30;
        config.statistics.red_limit = 20;

        let error = state(config).validate().unwrap_err();
        assert!(error.to_string().contains("above red limit"));
    }

    #[test]
    fn test_empty_user_header_rejected() {
        let mut config = Config::default();
        config.auth.user_header = "  ".to_string();
        assert!(state(config).validate().is_err());
    }

    #[test]
    fn test_fixed_clock() {
        let fixed = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        let state = state(Config::default()).with_clock(Arc::new(move || fixed));
        assert_eq!(state.now(), fixed);
    }
}
