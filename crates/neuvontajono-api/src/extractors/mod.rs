//! Custom extractors for request processing

use crate::state::AppState;
use axum::{
    Json, async_trait,
    extract::{FromRequestParts, Path},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use neuvontajono_core::{
    CourseId, Error, UserId,
    types::{Course, User},
};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tracing::{debug, error};

/// Custom error type for extractors
#[derive(Debug)]
pub struct ExtractorError {
    /// Error message
    pub message: String,
    /// HTTP status code
    pub status: StatusCode,
    /// Error code for API responses
    pub code: String,
}

impl ExtractorError {
    /// Create a new extractor error
    pub fn new(message: impl Into<String>, status: StatusCode, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
            code: code.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST, "BAD_REQUEST")
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND, "NOT_FOUND")
    }

    /// Create an internal server error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
    }
}

impl fmt::Display for ExtractorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ExtractorError {}

/// Error response for extractors
#[derive(Debug, Serialize)]
pub struct ExtractorErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
}

impl IntoResponse for ExtractorError {
    fn into_response(self) -> Response {
        let response = ExtractorErrorResponse {
            error: self.message,
            code: self.code,
        };

        (self.status, Json(response)).into_response()
    }
}

/// The course and user a request acts on
///
/// The user id and the CSRF token of the user's session are forwarded by the
/// upstream authentication layer in the headers named in `auth` configuration.
#[derive(Debug, Clone)]
pub struct CourseContext {
    /// Course from the path
    pub course: Course,
    /// Authenticated user
    pub user: User,
    /// Whether the user is course staff
    pub staff: bool,
    /// CSRF token of the user's session, if forwarded
    pub csrf: Option<String>,
}

impl CourseContext {
    /// Whether a submitted `_csrf` value matches the session token
    ///
    /// Without a forwarded token there is nothing to compare against and any value passes.
    #[must_use]
    pub fn csrf_matches(&self, submitted: Option<&str>) -> bool {
        self.csrf
            .as_deref()
            .is_none_or(|expected| submitted == Some(expected))
    }

    /// Token to embed in rendered forms
    #[must_use]
    pub fn csrf_token(&self) -> String {
        self.csrf.clone().unwrap_or_default()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CourseContext {
    type Rejection = ExtractorError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Path(course_id) = Path::<CourseId>::from_request_parts(parts, state)
            .await
            .map_err(|e| ExtractorError::bad_request(format!("Invalid course id: {e}")))?;

        let user_id = header_value(&parts.headers, &state.config.auth.user_header)
            .and_then(|value| value.parse::<UserId>().ok())
            .ok_or_else(|| ExtractorError::unauthorized("Authentication required"))?;

        let course = state
            .store
            .find_course(course_id)
            .await
            .map_err(|e| lookup_error(e, "Course not found"))?;
        let user = state
            .store
            .find_user(user_id)
            .await
            .map_err(|e| match e {
                Error::NotFound { .. } => ExtractorError::unauthorized("Unknown user"),
                other => lookup_error(other, "User not found"),
            })?;
        let staff = state
            .store
            .is_staff(course.id, user.id)
            .await
            .map_err(|e| lookup_error(e, "Staff lookup failed"))?;

        let csrf = header_value(&parts.headers, &state.config.auth.csrf_header).map(str::to_string);

        debug!(course_id = %course.id, user_id = %user.id, staff, "Resolved course context");

        Ok(Self {
            course,
            user,
            staff,
            csrf,
        })
    }
}

/// Whether the request is an asynchronous data fetch rather than a page load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XhrRequest(pub bool);

#[async_trait]
impl<S> FromRequestParts<S> for XhrRequest
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let requested_with = header_value(&parts.headers, "x-requested-with")
            .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"));
        let wants_json = header_value(&parts.headers, "accept")
            .is_some_and(|value| value.starts_with("application/json"));

        Ok(Self(requested_with || wants_json))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn lookup_error(err: Error, not_found: &str) -> ExtractorError {
    match err {
        Error::NotFound { .. } => ExtractorError::not_found(not_found),
        other => {
            error!("Course context lookup failed: {}", other);
            ExtractorError::internal_error("Lookup failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn context(csrf: Option<&str>) -> CourseContext {
        CourseContext {
            course: Course {
                id: Uuid::new_v4(),
                name: "Programming 1".to_string(),
            },
            user: User {
                id: Uuid::new_v4(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                previous_location: None,
            },
            staff: false,
            csrf: csrf.map(str::to_string),
        }
    }

    #[test]
    fn test_csrf_matching() {
        let ctx = context(Some("token"));
        assert!(ctx.csrf_matches(Some("token")));
        assert!(!ctx.csrf_matches(Some("other")));
        assert!(!ctx.csrf_matches(None));

        let ctx = context(None);
        assert!(ctx.csrf_matches(None));
        assert!(ctx.csrf_matches(Some("anything")));
        assert_eq!(ctx.csrf_token(), "");
    }

    #[test]
    fn test_header_value_trims_and_skips_blank() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("  abc "));
        headers.insert("x-csrf-token", HeaderValue::from_static("   "));

        assert_eq!(header_value(&headers, "x-user-id"), Some("abc"));
        assert_eq!(header_value(&headers, "x-csrf-token"), None);
        assert_eq!(header_value(&headers, "missing"), None);
    }

    #[test]
    fn test_lookup_error_status() {
        let missing = lookup_error(
            Error::NotFound {
                resource: "course".to_string(),
            },
            "Course not found",
        );
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let failed = lookup_error(Error::Database("down".to_string()), "Course not found");
        assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.to_string(), "INTERNAL_ERROR: Lookup failed");
    }
}
