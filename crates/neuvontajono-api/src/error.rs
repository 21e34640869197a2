//! Failures of queue and statistics actions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use neuvontajono_web::ViewError;
use serde_json::json;
use tracing::{error, warn};

/// Result of a handler
pub type ApiResult<T> = Result<T, ApiError>;

/// Why a request was not carried out
///
/// Every variant except [`ApiError::Render`] is reported to the client as the
/// same `{"error": true}` body; the cause only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Store lookup or write failed, or a record is missing
    #[error("store: {0}")]
    Store(#[from] neuvontajono_core::Error),

    /// The form body could not be decoded
    #[error("form: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// A submitted field is missing or malformed
    #[error("invalid field {field}: {message}")]
    InvalidField {
        /// Form field name
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The session is not accepting queue actions
    #[error("session {0} is not open")]
    SessionClosed(neuvontajono_core::SessionId),

    /// `_csrf` does not match the user's session
    #[error("CSRF token mismatch")]
    Csrf,

    /// The action is limited to course staff
    #[error("staff only")]
    Forbidden,

    /// The `action` field names nothing this endpoint does
    #[error("unknown action {0:?}")]
    UnknownAction(String),

    /// A page could not be rendered
    #[error("render: {0}")]
    Render(#[from] ViewError),
}

impl ApiError {
    /// Shorthand for a malformed field
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(err: askama::Error) -> Self {
        Self::Render(ViewError::Render(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Render(err) = &self {
            error!("Page rendering failed: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        warn!(error = %self, "Action rejected");
        (StatusCode::OK, Json(json!({ "error": true }))).into_response()
    }
}
