//! Core types and utilities for the neuvontajono help queue

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod statistics;
pub mod types;
pub mod utils;

/// Errors raised while the service starts up
///
/// Each error carries a human readable step description and the underlying cause.
pub mod context_error {
    use std::{error::Error as StdError, fmt};

    type Cause = Box<dyn StdError + Send + Sync>;

    /// Startup failure with the step that failed
    #[derive(Debug)]
    pub struct ContextError {
        step: String,
        cause: Option<Cause>,
    }

    impl ContextError {
        /// Failure without an underlying cause
        pub fn new<S: Into<String>>(step: S) -> Self {
            Self {
                step: step.into(),
                cause: None,
            }
        }

        /// Failure of `step` caused by `error`
        pub fn with_context<E, S>(error: E, step: S) -> Self
        where
            E: Into<Cause>,
            S: Into<String>,
        {
            Self {
                step: step.into(),
                cause: Some(error.into()),
            }
        }

        /// Description of the step that failed
        #[must_use]
        pub fn step(&self) -> &str {
            &self.step
        }
    }

    impl fmt::Display for ContextError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match &self.cause {
                Some(cause) => write!(f, "{}: {cause}", self.step),
                None => write!(f, "{}", self.step),
            }
        }
    }

    impl StdError for ContextError {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.cause
                .as_ref()
                .map(|e| e.as_ref() as &(dyn StdError + 'static))
        }
    }

    /// Result type alias for startup errors
    pub type Result<T> = std::result::Result<T, ContextError>;

    /// Attach a step description to any error
    pub trait ResultExt<T> {
        /// Wrap the error with the step produced by `f`
        fn with_context<F, S>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> S,
            S: Into<String>;
    }

    impl<T, E> ResultExt<T> for std::result::Result<T, E>
    where
        E: StdError + Send + Sync + 'static,
    {
        fn with_context<F, S>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> S,
            S: Into<String>,
        {
            self.map_err(|e| ContextError::with_context(e, f()))
        }
    }

    impl From<crate::Error> for ContextError {
        fn from(err: crate::Error) -> Self {
            Self::with_context(err, "Startup failed")
        }
    }

    impl From<std::io::Error> for ContextError {
        fn from(err: std::io::Error) -> Self {
            Self::with_context(err, "I/O operation failed")
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_context_is_prefixed() {
            let io: std::result::Result<(), std::io::Error> =
                Err(std::io::Error::other("address in use"));
            let err = io.with_context(|| "Failed to bind 0.0.0.0:3000").unwrap_err();

            assert_eq!(err.step(), "Failed to bind 0.0.0.0:3000");
            assert_eq!(err.to_string(), "Failed to bind 0.0.0.0:3000: address in use");
            assert!(err.source().is_some());
        }

        #[test]
        fn test_core_error_conversion() {
            let err = ContextError::from(crate::Error::Database("refused".to_string()));
            assert_eq!(err.to_string(), "Startup failed: Database error: refused");
            assert!(ContextError::new("plain").source().is_none());
        }
    }
}

// Re-export commonly used types
pub use config::{Config, LoggingConfig};
pub use error::{Error, Result};
pub use types::{CourseId, SessionId, UserId};

/// Initialize the logging system
///
/// `RUST_LOG` overrides the configured level. The format is `json` or `text`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> context_error::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.format.eq_ignore_ascii_case("text") {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    };

    result.map_err(|e| context_error::ContextError::with_context(e, "Failed to install tracing subscriber"))
}
