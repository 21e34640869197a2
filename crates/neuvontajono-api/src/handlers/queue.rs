//! Queue actions: join, sign up and leave
//!
//! Every failure collapses into `{"error": true}` so the client only learns
//! that the action was rejected and nothing changed.

use crate::{
    error::{ApiError, ApiResult},
    extractors::{CourseContext, XhrRequest},
    handlers::summary::build_summary,
    state::AppState,
};
use askama::Template;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::NaiveDateTime;
use neuvontajono_core::{
    CourseId, SessionId,
    types::{
        CourseSummary, NewParticipant, NewQueueEntry, ParticipationMode, QueueEntry, REMOTE_LOCATION,
        REMOTE_ROW, Session,
    },
    utils::{format_sample, minutes_after_midnight, sanitize_call_url},
};
use neuvontajono_database::QueueStore;
use neuvontajono_web::script_safe_json;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use validator::Validate;

/// Form posted by the queue page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueForm {
    /// `add`, `signUp` or `remove`; absent for a plain refresh
    pub action: Option<String>,
    /// Session to queue in or sign up to
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    /// Room or free-text location
    pub location: Option<String>,
    /// Seat row
    pub row: Option<String>,
    /// Preferred language
    pub language: Option<String>,
    /// `remote` or `local`
    #[serde(rename = "participationMode")]
    pub participation_mode: Option<String>,
    /// Call link for remote participants
    #[serde(rename = "callURL")]
    pub call_url: Option<String>,
    /// CSRF token of the page
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
}

/// Join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    /// Session to queue in
    pub session_id: SessionId,
    /// Submitted location
    pub location: String,
    /// Submitted row, unparsed
    pub row: Option<String>,
    /// Submitted language
    pub language: String,
    /// Local or remote
    pub mode: ParticipationMode,
    /// Submitted call link, unsanitized
    pub call_url: String,
}

/// Sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    /// Session to sign up to
    pub session_id: SessionId,
    /// Where the student sits
    pub location: String,
}

/// A decoded queue form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAction {
    /// No action; only the summary is returned
    Refresh,
    /// Join the queue
    Add(AddRequest),
    /// Record attendance without queueing
    SignUp(SignUpRequest),
    /// Leave the queue
    Remove,
}

impl QueueForm {
    /// Decode the action named by the form
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown action or a missing or malformed session id.
    pub fn action(&self) -> ApiResult<QueueAction> {
        match self.action.as_deref().map(str::trim) {
            None | Some("") => Ok(QueueAction::Refresh),
            Some("add") => Ok(QueueAction::Add(AddRequest {
                session_id: self.session_id()?,
                location: field(self.location.as_deref()),
                row: self.row.clone(),
                language: field(self.language.as_deref()),
                mode: ParticipationMode::from_form(self.participation_mode.as_deref()),
                call_url: self.call_url.clone().unwrap_or_default(),
            })),
            Some("signUp") => Ok(QueueAction::SignUp(SignUpRequest {
                session_id: self.session_id()?,
                location: field(self.location.as_deref()),
            })),
            Some("remove") => Ok(QueueAction::Remove),
            Some(other) => Err(ApiError::UnknownAction(other.to_string())),
        }
    }

    fn session_id(&self) -> ApiResult<SessionId> {
        let raw = self
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::invalid("sessionId", "missing"))?;
        raw.parse()
            .map_err(|e| ApiError::invalid("sessionId", format!("{e}")))
    }
}

fn field(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Look up a session of the course that accepts queue actions at `now`
///
/// # Errors
///
/// Returns an error if the session is missing, belongs to another course, is
/// inactive or is outside its time window.
pub async fn open_session(
    store: &dyn QueueStore,
    course_id: CourseId,
    session_id: SessionId,
    now: NaiveDateTime,
) -> ApiResult<Session> {
    let session = store.find_session(course_id, session_id).await?;
    if !session.is_open(now) {
        return Err(ApiError::SessionClosed(session.id));
    }
    Ok(session)
}

/// Turn a join request into the entry to store
///
/// Remote participants always get [`REMOTE_ROW`] and keep a sanitized call
/// link; everyone else loses the link.
///
/// # Errors
///
/// Returns an error if a local row is not a non-negative number or a field is
/// out of bounds.
pub fn prepare_entry(
    ctx: &CourseContext,
    session: &Session,
    request: &AddRequest,
) -> ApiResult<NewQueueEntry> {
    let (row, call_url) = match request.mode {
        ParticipationMode::Remote => (REMOTE_ROW, sanitize_call_url(&request.call_url)),
        ParticipationMode::Local => {
            let row = request
                .row
                .as_deref()
                .map(str::trim)
                .ok_or_else(|| ApiError::invalid("row", "missing"))?
                .parse::<i32>()
                .map_err(|e| ApiError::invalid("row", e.to_string()))?;
            if row < 0 {
                return Err(ApiError::invalid("row", "negative row in local mode"));
            }
            (row, String::new())
        }
    };

    let location = match (request.mode, request.location.is_empty()) {
        (ParticipationMode::Remote, true) => REMOTE_LOCATION.to_string(),
        (ParticipationMode::Local, true) => return Err(ApiError::invalid("location", "missing")),
        (_, false) => request.location.clone(),
    };
    let language = if request.language.is_empty() {
        session.language.clone()
    } else {
        request.language.clone()
    };

    let entry = NewQueueEntry {
        course_id: ctx.course.id,
        session_id: session.id,
        user_id: ctx.user.id,
        location,
        row,
        language,
        call_url,
    };
    entry
        .validate()
        .map_err(|e| ApiError::invalid("entry", e.to_string()))?;

    Ok(entry)
}

/// Put the user in the queue
///
/// On success the queue length is sampled in the background; a failing sample
/// write is only logged.
///
/// # Errors
///
/// Returns an error if the session is not open, the request is invalid or the store fails.
pub async fn add(
    store: &Arc<dyn QueueStore>,
    ctx: &CourseContext,
    request: &AddRequest,
    now: NaiveDateTime,
) -> ApiResult<QueueEntry> {
    let session = open_session(store.as_ref(), ctx.course.id, request.session_id, now).await?;
    let new_entry = prepare_entry(ctx, &session, request)?;
    let entry = store.add_to_queue(&new_entry).await?;

    info!(
        course_id = %ctx.course.id,
        session_id = %session.id,
        user_id = %ctx.user.id,
        remote = entry.is_remote(),
        "User joined the queue"
    );

    spawn_queue_length_sample(Arc::clone(store), ctx.course.id, session.id, now);

    let attendance = NewParticipant {
        course_id: ctx.course.id,
        session_id: session.id,
        user_id: ctx.user.id,
        location: entry.location.clone(),
        signed_up: false,
        date: now.date(),
    };
    if let Err(e) = store.add_participant(&attendance).await {
        warn!("Failed to record attendance of queued user {}: {}", ctx.user.id, e);
    }

    Ok(entry)
}

/// Record attendance without queueing and remember the location
///
/// Returns the location now stored as the user's previous location.
///
/// # Errors
///
/// Returns an error if the session is not open, the location is empty or the store fails.
pub async fn sign_up(
    store: &dyn QueueStore,
    ctx: &CourseContext,
    request: &SignUpRequest,
    now: NaiveDateTime,
) -> ApiResult<String> {
    let session = open_session(store, ctx.course.id, request.session_id, now).await?;
    if request.location.is_empty() {
        return Err(ApiError::invalid("location", "missing"));
    }

    store
        .add_participant(&NewParticipant {
            course_id: ctx.course.id,
            session_id: session.id,
            user_id: ctx.user.id,
            location: request.location.clone(),
            signed_up: true,
            date: now.date(),
        })
        .await?;
    store
        .save_previous_location(ctx.user.id, &request.location)
        .await?;

    info!(course_id = %ctx.course.id, session_id = %session.id, user_id = %ctx.user.id, "User signed up");
    Ok(request.location.clone())
}

/// Take the user out of the course queue
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn remove(store: &dyn QueueStore, ctx: &CourseContext) -> ApiResult<()> {
    let removed = store.remove_from_queue(ctx.course.id, ctx.user.id).await?;
    debug!(course_id = %ctx.course.id, user_id = %ctx.user.id, removed, "Queue removal");
    Ok(())
}

/// Append the current queue length of the session to its statistics
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn record_queue_length(
    store: &dyn QueueStore,
    course_id: CourseId,
    session_id: SessionId,
    now: NaiveDateTime,
) -> neuvontajono_core::Result<()> {
    let length = store.queue_length(course_id, session_id).await?;
    let sample = format_sample(minutes_after_midnight(now.time()), length);
    store
        .append_session_sample(course_id, session_id, now.date(), &sample)
        .await
}

/// Sample the queue length without waiting for the write
pub fn spawn_queue_length_sample(
    store: Arc<dyn QueueStore>,
    course_id: CourseId,
    session_id: SessionId,
    now: NaiveDateTime,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = record_queue_length(store.as_ref(), course_id, session_id, now).await {
            warn!("Failed to save queue length of session {}: {}", session_id, e);
        }
    })
}

/// Apply a queue form
///
/// Successful actions answer with the summary for asynchronous requests and
/// with a redirect back to the queue page otherwise.
///
/// # Errors
///
/// Any failure is answered with `{"error": true}`.
pub async fn post_queue(
    State(state): State<Arc<AppState>>,
    mut ctx: CourseContext,
    XhrRequest(xhr): XhrRequest,
    body: Bytes,
) -> ApiResult<Response> {
    let form: QueueForm = serde_urlencoded::from_bytes(&body)?;
    if !ctx.csrf_matches(form.csrf.as_deref()) {
        return Err(ApiError::Csrf);
    }

    let now = state.now();
    match form.action()? {
        QueueAction::Refresh => {}
        QueueAction::Add(request) => {
            add(&state.store, &ctx, &request, now).await?;
        }
        QueueAction::SignUp(request) => {
            let location = sign_up(state.store.as_ref(), &ctx, &request, now).await?;
            ctx.user.previous_location = Some(location);
        }
        QueueAction::Remove => remove(state.store.as_ref(), &ctx).await?,
    }

    if xhr {
        let summary = build_summary(state.store.as_ref(), &ctx.course, &ctx.user, ctx.staff, now).await?;
        return Ok(Json(summary).into_response());
    }
    Ok(Redirect::to(&queue_path(ctx.course.id)).into_response())
}

/// Summary of the course for the current user, as JSON
///
/// # Errors
///
/// Any failure is answered with `{"error": true}`.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    ctx: CourseContext,
) -> ApiResult<Json<CourseSummary>> {
    let summary = build_summary(
        state.store.as_ref(),
        &ctx.course,
        &ctx.user,
        ctx.staff,
        state.now(),
    )
    .await?;
    Ok(Json(summary))
}

/// Queue page with the summary embedded
///
/// # Errors
///
/// Store failures are answered with `{"error": true}`, rendering failures with 500.
pub async fn queue_page(
    State(state): State<Arc<AppState>>,
    ctx: CourseContext,
) -> ApiResult<Html<String>> {
    let summary = build_summary(
        state.store.as_ref(),
        &ctx.course,
        &ctx.user,
        ctx.staff,
        state.now(),
    )
    .await?;

    let page = QueuePageTemplate {
        title: &ctx.course.name,
        action: queue_path(ctx.course.id),
        summary_path: format!("{}/summary", queue_path(ctx.course.id)),
        csrf: ctx.csrf_token(),
        summary_json: script_safe_json(&summary)?,
    };
    Ok(Html(page.render()?))
}

/// Path of the queue page of a course
#[must_use]
pub fn queue_path(course_id: CourseId) -> String {
    format!("/course/{course_id}/queue")
}

#[derive(Template)]
#[template(path = "queue.html")]
struct QueuePageTemplate<'a> {
    title: &'a str,
    action: String,
    summary_path: String,
    csrf: String,
    summary_json: String,
}
