//! Configuration management for the help queue

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Headers set by the upstream authentication layer
    #[serde(default)]
    pub auth: AuthConfig,

    /// Statistics page configuration
    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL; `memory:` selects the in-process store
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

impl DatabaseConfig {
    /// Whether the configured URL points at the in-memory store
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory:")
    }
}

/// Authentication context configuration
///
/// Sessions and CSRF tokens are issued upstream; the reverse proxy or session
/// middleware forwards the resolved user id and the session's token in these headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the authenticated user's id
    #[serde(default = "default_user_header")]
    pub user_header: String,

    /// Header carrying the CSRF token bound to the user's session
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
            csrf_header: default_csrf_header(),
        }
    }
}

/// Statistics page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Show the queue length graph on hover
    #[serde(default = "default_show_graph")]
    pub show_graph: bool,

    /// Number of rows in the most active participants table
    #[serde(default = "default_most_frequent_limit")]
    pub most_frequent_limit: i64,

    /// Participant count at which a cell turns red
    #[serde(default = "default_red_limit")]
    pub red_limit: i64,

    /// Participant count at which a cell turns yellow
    #[serde(default = "default_yellow_limit")]
    pub yellow_limit: i64,

    /// Moment-style date pattern used by the participant search form
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Language of the user interface
    #[serde(default = "default_ui_language")]
    pub ui_language: String,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            show_graph: default_show_graph(),
            most_frequent_limit: default_most_frequent_limit(),
            red_limit: default_red_limit(),
            yellow_limit: default_yellow_limit(),
            date_format: default_date_format(),
            ui_language: default_ui_language(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log to file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_idle_timeout() -> u64 {
    600
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

fn default_csrf_header() -> String {
    "x-csrf-token".to_string()
}

const fn default_show_graph() -> bool {
    true
}

const fn default_most_frequent_limit() -> i64 {
    10
}

const fn default_red_limit() -> i64 {
    20
}

const fn default_yellow_limit() -> i64 {
    10
}

fn default_date_format() -> String {
    "D.M.YYYY".to_string()
}

fn default_ui_language() -> String {
    "en".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Load configuration from environment and files
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("NEUVONTAJONO").separator("_"))
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        config
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        let database_url = std::env::var("NEUVONTAJONO_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "postgresql://localhost/neuvontajono".to_string());

        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout: default_connect_timeout(),
                idle_timeout: default_idle_timeout(),
            },
            auth: AuthConfig::default(),
            statistics: StatisticsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
