//! Storage interface used by the request handlers

use async_trait::async_trait;
use chrono::NaiveDate;
use neuvontajono_core::{
    CourseId, Result, SessionId, UserId,
    types::{Course, NewParticipant, NewQueueEntry, Participant, QueueEntry, Session, SessionStats, User},
};
use serde::{Deserialize, Serialize};

/// Queue entry together with the queued user's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// The entry
    pub entry: QueueEntry,
    /// Given name of the queued user
    pub first_name: String,
    /// Family name of the queued user
    pub last_name: String,
}

/// Attendance record together with the attendee's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// The attendance record
    pub participant: Participant,
    /// Given name of the attendee
    pub first_name: String,
    /// Family name of the attendee
    pub last_name: String,
}

/// Number of distinct attendees of one session occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCount {
    /// Session
    pub session_id: SessionId,
    /// Date of the occurrence
    pub date: NaiveDate,
    /// Distinct attendees
    pub count: i64,
}

/// A user with the number of distinct dates they attended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentUser {
    /// The user
    pub user_id: UserId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Distinct attended dates
    pub visits: i64,
}

/// Persistence operations of the help queue
///
/// Implemented by the PostgreSQL [`crate::Database`] and by [`crate::InMemoryStore`].
/// Missing rows are reported as [`neuvontajono_core::Error::NotFound`].
#[async_trait]
pub trait QueueStore: Send + Sync + std::fmt::Debug {
    /// Look up a course
    async fn find_course(&self, course_id: CourseId) -> Result<Course>;

    /// Look up a user
    async fn find_user(&self, user_id: UserId) -> Result<User>;

    /// Whether the user is staff on the course
    async fn is_staff(&self, course_id: CourseId, user_id: UserId) -> Result<bool>;

    /// Sessions of a course ordered by weekday, start time and name
    async fn list_sessions(&self, course_id: CourseId) -> Result<Vec<Session>>;

    /// Look up a session that belongs to the course
    async fn find_session(&self, course_id: CourseId, session_id: SessionId) -> Result<Session>;

    /// Put the user in the course queue
    ///
    /// A user already in the queue keeps their place; the other fields are replaced.
    async fn add_to_queue(&self, entry: &NewQueueEntry) -> Result<QueueEntry>;

    /// Remove the user from the course queue, returning whether an entry existed
    async fn remove_from_queue(&self, course_id: CourseId, user_id: UserId) -> Result<bool>;

    /// Queue of the course in joining order
    async fn queue_for_course(&self, course_id: CourseId) -> Result<Vec<QueueRecord>>;

    /// Number of entries queued for the session
    async fn queue_length(&self, course_id: CourseId, session_id: SessionId) -> Result<usize>;

    /// Append a `"M|L"` sample to the session's statistics of `date`
    async fn append_session_sample(
        &self,
        course_id: CourseId,
        session_id: SessionId,
        date: NaiveDate,
        sample: &str,
    ) -> Result<()>;

    /// All recorded statistics of a course
    async fn session_stats(&self, course_id: CourseId) -> Result<Vec<SessionStats>>;

    /// Record attendance
    ///
    /// Repeated records for the same session, user and date are merged; `signed_up` sticks once set.
    async fn add_participant(&self, participant: &NewParticipant) -> Result<()>;

    /// Attendees of a course on `date`, optionally limited to one session, ordered by name
    async fn participants(
        &self,
        course_id: CourseId,
        session_id: Option<SessionId>,
        date: NaiveDate,
    ) -> Result<Vec<ParticipantRecord>>;

    /// Distinct attendee counts per session occurrence
    async fn participant_counts(&self, course_id: CourseId) -> Result<Vec<ParticipantCount>>;

    /// Users with the most distinct attended dates, most frequent first
    async fn most_frequent(&self, course_id: CourseId, limit: i64) -> Result<Vec<FrequentUser>>;

    /// Remember the location the user signed up with
    async fn save_previous_location(&self, user_id: UserId, location: &str) -> Result<()>;

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<()>;
}
