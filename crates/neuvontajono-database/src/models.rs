//! Database row models

use chrono::{DateTime, NaiveDate, Utc};
use neuvontajono_core::{
    Error, Result,
    types::{Course, Participant, QueueEntry, Session, SessionStats, User},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::{FrequentUser, ParticipantCount, ParticipantRecord, QueueRecord};

/// Row of the `courses` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseDb {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
}

impl From<CourseDb> for Course {
    fn from(row: CourseDb) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Row of the `users` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserDb {
    /// Unique identifier
    pub id: Uuid,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Location of the last sign-up
    pub previous_location: Option<String>,
}

impl From<UserDb> for User {
    fn from(row: UserDb) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            previous_location: row.previous_location,
        }
    }
}

/// Row of the `sessions` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionDb {
    /// Unique identifier
    pub id: Uuid,
    /// Owning course
    pub course_id: Uuid,
    /// Display name
    pub name: String,
    /// Locations
    pub locations: Vec<String>,
    /// Teaching language
    pub language: String,
    /// Day of the week, 0 = Monday
    pub weekday: i16,
    /// Start, minutes after midnight
    pub start_time: i32,
    /// End, minutes after midnight
    pub end_time: i32,
    /// First date
    pub start_date: NaiveDate,
    /// Last date
    pub end_date: NaiveDate,
    /// Active flag
    pub active: bool,
}

impl TryFrom<SessionDb> for Session {
    type Error = Error;

    fn try_from(row: SessionDb) -> Result<Self> {
        let out_of_range =
            |field: &str| Error::Database(format!("Session {} has invalid {field}", row.id));

        Ok(Self {
            weekday: u8::try_from(row.weekday).map_err(|_| out_of_range("weekday"))?,
            start_time: u16::try_from(row.start_time).map_err(|_| out_of_range("start_time"))?,
            end_time: u16::try_from(row.end_time).map_err(|_| out_of_range("end_time"))?,
            id: row.id,
            course_id: row.course_id,
            name: row.name,
            locations: row.locations,
            language: row.language,
            start_date: row.start_date,
            end_date: row.end_date,
            active: row.active,
        })
    }
}

/// Row of the `queue_entries` table joined with the user's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueEntryDb {
    /// Unique identifier
    pub id: Uuid,
    /// Course
    pub course_id: Uuid,
    /// Session
    pub session_id: Uuid,
    /// Queued user
    pub user_id: Uuid,
    /// Location
    pub location: String,
    /// Seat row, -1 for remote
    pub seat_row: i32,
    /// Language
    pub language: String,
    /// Call link
    pub call_url: String,
    /// Joining time
    pub created_at: DateTime<Utc>,
    /// Given name of the queued user
    #[sqlx(default)]
    pub first_name: String,
    /// Family name of the queued user
    #[sqlx(default)]
    pub last_name: String,
}

impl From<QueueEntryDb> for QueueRecord {
    fn from(row: QueueEntryDb) -> Self {
        Self {
            entry: QueueEntry {
                id: row.id,
                course_id: row.course_id,
                session_id: row.session_id,
                user_id: row.user_id,
                location: row.location,
                row: row.seat_row,
                language: row.language,
                call_url: row.call_url,
                created_at: row.created_at,
            },
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

/// Row of the `participants` table joined with the user's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParticipantDb {
    /// Unique identifier
    pub id: Uuid,
    /// Course
    pub course_id: Uuid,
    /// Session
    pub session_id: Uuid,
    /// Attendee
    pub user_id: Uuid,
    /// Location
    pub location: String,
    /// Signed up explicitly
    pub signed_up: bool,
    /// Date of the occurrence
    pub date: NaiveDate,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

impl From<ParticipantDb> for ParticipantRecord {
    fn from(row: ParticipantDb) -> Self {
        Self {
            participant: Participant {
                id: row.id,
                course_id: row.course_id,
                session_id: row.session_id,
                user_id: row.user_id,
                location: row.location,
                signed_up: row.signed_up,
                date: row.date,
            },
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

/// Row of the `session_stats` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionStatsDb {
    /// Course
    pub course_id: Uuid,
    /// Session
    pub session_id: Uuid,
    /// Date of the occurrence
    pub date: NaiveDate,
    /// Encoded samples
    pub samples: Vec<String>,
}

impl From<SessionStatsDb> for SessionStats {
    fn from(row: SessionStatsDb) -> Self {
        Self {
            course_id: row.course_id,
            session_id: row.session_id,
            date: row.date,
            samples: row.samples,
        }
    }
}

/// Aggregated attendee count row
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantCountDb {
    /// Session
    pub session_id: Uuid,
    /// Date of the occurrence
    pub date: NaiveDate,
    /// Distinct attendees
    pub count: i64,
}

impl From<ParticipantCountDb> for ParticipantCount {
    fn from(row: ParticipantCountDb) -> Self {
        Self {
            session_id: row.session_id,
            date: row.date,
            count: row.count,
        }
    }
}

/// Aggregated visit count row
#[derive(Debug, Clone, FromRow)]
pub struct FrequentUserDb {
    /// User
    pub user_id: Uuid,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Distinct attended dates
    pub visits: i64,
}

impl From<FrequentUserDb> for FrequentUser {
    fn from(row: FrequentUserDb) -> Self {
        Self {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            visits: row.visits,
        }
    }
}
