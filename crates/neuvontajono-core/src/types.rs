//! Core data types for the help queue

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::minutes_after_midnight;

/// Course identifier type
pub type CourseId = Uuid;

/// Session identifier type
pub type SessionId = Uuid;

/// User identifier type
pub type UserId = Uuid;

/// Row value stored for participants who join remotely
pub const REMOTE_ROW: i32 = -1;

/// Location value stored for participants who join remotely
pub const REMOTE_LOCATION: &str = "REMOTELOCATION";

/// A course offering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    /// Unique identifier
    pub id: CourseId,
    /// Display name
    pub name: String,
}

/// A user known to the application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Location used the last time the user signed up
    pub previous_location: Option<String>,
}

impl User {
    /// Full display name
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One weekly help session of a course
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,
    /// Owning course
    pub course_id: CourseId,
    /// Display name
    pub name: String,
    /// Physical locations where the session is held
    pub locations: Vec<String>,
    /// Teaching language
    pub language: String,
    /// Day of the week, 0 = Monday
    pub weekday: u8,
    /// Start time in minutes after midnight
    pub start_time: u16,
    /// End time in minutes after midnight
    pub end_time: u16,
    /// First date the session is held
    pub start_date: NaiveDate,
    /// Last date the session is held
    pub end_date: NaiveDate,
    /// Inactive sessions never open
    pub active: bool,
}

impl Session {
    /// Whether the session accepts queue actions at `now` (local time)
    #[must_use]
    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        if !self.active || !self.is_held_on(now.date()) {
            return false;
        }
        let minutes = minutes_after_midnight(now.time());
        self.start_time <= minutes && minutes < self.end_time
    }

    /// Whether the session takes place on `date`
    #[must_use]
    pub fn is_held_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date
            && date <= self.end_date
            && date.weekday().num_days_from_monday() == u32::from(self.weekday)
    }

    /// All dates the session is held on, in order
    #[must_use]
    pub fn occurrences(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
            .filter(|date| self.is_held_on(*date))
            .collect()
    }
}

/// How a student takes part in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationMode {
    /// In the room
    Local,
    /// Over a video call
    Remote,
}

impl ParticipationMode {
    /// Parse the submitted form value; anything but `remote` means local
    #[must_use]
    pub fn from_form(value: Option<&str>) -> Self {
        match value {
            Some("remote") => Self::Remote,
            _ => Self::Local,
        }
    }
}

/// Queue entry about to be stored
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewQueueEntry {
    /// Course of the queue
    pub course_id: CourseId,
    /// Session the student queues in
    pub session_id: SessionId,
    /// Student
    pub user_id: UserId,
    /// Physical location or free text
    #[validate(length(max = 100))]
    pub location: String,
    /// Seat row, [`REMOTE_ROW`] for remote participants
    #[validate(range(min = -1, max = 1000))]
    pub row: i32,
    /// Preferred language
    #[validate(length(max = 20))]
    pub language: String,
    /// Call link for remote participants, empty otherwise
    #[validate(length(max = 2048))]
    pub call_url: String,
}

/// A student's place in the queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Course of the queue
    pub course_id: CourseId,
    /// Session the student queues in
    pub session_id: SessionId,
    /// Student
    pub user_id: UserId,
    /// Physical location or free text
    pub location: String,
    /// Seat row, [`REMOTE_ROW`] for remote participants
    pub row: i32,
    /// Preferred language
    pub language: String,
    /// Call link for remote participants
    #[serde(rename = "callURL")]
    pub call_url: String,
    /// When the student joined
    pub created_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Whether the entry was made for remote participation
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.row == REMOTE_ROW
    }
}

/// Attendance record about to be stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipant {
    /// Course
    pub course_id: CourseId,
    /// Session attended
    pub session_id: SessionId,
    /// Attendee
    pub user_id: UserId,
    /// Location used
    pub location: String,
    /// Signed up explicitly rather than only queueing
    pub signed_up: bool,
    /// Date of the session occurrence
    pub date: NaiveDate,
}

/// An attendee of one session occurrence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique identifier
    pub id: Uuid,
    /// Course
    pub course_id: CourseId,
    /// Session attended
    pub session_id: SessionId,
    /// Attendee
    pub user_id: UserId,
    /// Location used
    pub location: String,
    /// Signed up explicitly rather than only queueing
    pub signed_up: bool,
    /// Date of the session occurrence
    pub date: NaiveDate,
}

/// Queue length samples of one session occurrence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Course
    pub course_id: CourseId,
    /// Session
    pub session_id: SessionId,
    /// Date of the occurrence
    pub date: NaiveDate,
    /// Encoded `"M|L"` samples in the order they were taken
    pub samples: Vec<String>,
}

/// Open session as shown in the queue summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id
    pub id: SessionId,
    /// Display name
    pub name: String,
    /// Selectable locations
    pub locations: Vec<String>,
    /// Teaching language
    pub language: String,
    /// Start time as `H:MM`
    pub start_time: String,
    /// End time as `H:MM`
    pub end_time: String,
}

/// Queue entry as shown in the queue summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryView {
    /// 1-based position in the queue
    pub position: usize,
    /// Student's name, only shown to staff and to the student
    pub name: String,
    /// The entry itself
    #[serde(flatten)]
    pub entry: QueueEntry,
}

/// Participant as shown in the queue summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    /// Attendee's name
    pub name: String,
    /// Session attended
    pub session_id: SessionId,
    /// Location used
    pub location: String,
    /// Signed up explicitly
    pub signed_up: bool,
}

/// Snapshot of a course's queue for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    /// Course id
    pub course_id: CourseId,
    /// Course name
    pub course_name: String,
    /// Whether the requesting user is staff on the course
    pub staff: bool,
    /// Sessions open right now
    pub sessions: Vec<SessionSummary>,
    /// Number of students in the queue
    pub queue_length: usize,
    /// Requesting user's 1-based position, if queued
    pub my_position: Option<usize>,
    /// Visible queue entries
    pub queue: Vec<QueueEntryView>,
    /// Visible participants of today's open sessions
    pub participants: Vec<ParticipantView>,
    /// Location pre-fill for the sign-up form
    pub previous_location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;

    fn monday_session() -> Session {
        Session {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            name: "Monday lab".to_string(),
            locations: vec!["A101".to_string()],
            language: "en".to_string(),
            weekday: 0,
            start_time: 10 * 60,
            end_time: 12 * 60,
            start_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
            active: true,
        }
    }

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
    }

    #[test]
    fn test_session_open_inside_window() {
        let session = monday_session();
        assert!(session.is_open(at((2024, 9, 9), 10, 0)));
        assert!(session.is_open(at((2024, 9, 9), 11, 59)));
    }

    #[test]
    fn test_session_closed_outside_window() {
        let session = monday_session();
        // End time is exclusive
        assert!(!session.is_open(at((2024, 9, 9), 12, 0)));
        assert!(!session.is_open(at((2024, 9, 9), 9, 59)));
        // Tuesday
        assert!(!session.is_open(at((2024, 9, 10), 10, 30)));
        // Before the first and after the last date
        assert!(!session.is_open(at((2024, 8, 26), 10, 30)));
        assert!(!session.is_open(at((2024, 10, 7), 10, 30)));
    }

    #[test]
    fn test_inactive_session_never_open() {
        let mut session = monday_session();
        session.active = false;
        assert!(!session.is_open(at((2024, 9, 9), 10, 30)));
    }

    #[test]
    fn test_session_occurrences() {
        let session = monday_session();
        let dates = session.occurrences();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
        assert_eq!(dates[4], NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    }

    #[test]
    fn test_participation_mode_from_form() {
        assert_eq!(
            ParticipationMode::from_form(Some("remote")),
            ParticipationMode::Remote
        );
        assert_eq!(
            ParticipationMode::from_form(Some("local")),
            ParticipationMode::Local
        );
        assert_eq!(ParticipationMode::from_form(None), ParticipationMode::Local);
    }

    #[test]
    fn test_queue_entry_serializes_call_url_name() {
        let entry = QueueEntry {
            id: Uuid::nil(),
            course_id: Uuid::nil(),
            session_id: Uuid::nil(),
            user_id: Uuid::nil(),
            location: "A101".to_string(),
            row: REMOTE_ROW,
            language: "fi".to_string(),
            call_url: "https://meet.example/abc".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["callURL"], "https://meet.example/abc");
        assert_eq!(json["row"], -1);
        assert!(entry.is_remote());
    }

    #[test]
    fn test_new_queue_entry_validation() {
        let mut entry = NewQueueEntry {
            course_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            location: "A101".to_string(),
            row: 3,
            language: "en".to_string(),
            call_url: String::new(),
        };
        assert!(entry.validate().is_ok());

        entry.row = -2;
        assert!(entry.validate().is_err());

        entry.row = REMOTE_ROW;
        entry.location = "x".repeat(101);
        assert!(entry.validate().is_err());
    }
}
