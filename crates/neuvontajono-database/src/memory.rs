//! In-process store used for development and tests

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use neuvontajono_core::{
    CourseId, Error, Result, SessionId, UserId,
    types::{
        Course, NewParticipant, NewQueueEntry, Participant, QueueEntry, Session, SessionStats,
        User,
    },
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{FrequentUser, ParticipantCount, ParticipantRecord, QueueRecord, QueueStore};

#[derive(Debug, Default)]
struct State {
    courses: HashMap<CourseId, Course>,
    users: HashMap<UserId, User>,
    staff: HashSet<(CourseId, UserId)>,
    sessions: HashMap<SessionId, Session>,
    queue: Vec<QueueEntry>,
    participants: Vec<Participant>,
    stats: BTreeMap<(NaiveDate, SessionId), SessionStats>,
}

impl State {
    fn user_name(&self, user_id: UserId) -> (String, String) {
        self.users.get(&user_id).map_or_else(
            || (String::new(), String::new()),
            |user| (user.first_name.clone(), user.last_name.clone()),
        )
    }
}

/// Store keeping everything in memory
///
/// Selected with a `memory:` database URL. Data is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_stats_writes: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a course
    pub async fn insert_course(&self, course: Course) {
        self.state.write().await.courses.insert(course.id, course);
    }

    /// Add or replace a user
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Add or replace a session
    pub async fn insert_session(&self, session: Session) {
        self.state.write().await.sessions.insert(session.id, session);
    }

    /// Make the user staff on the course
    pub async fn add_staff(&self, course_id: CourseId, user_id: UserId) {
        self.state.write().await.staff.insert((course_id, user_id));
    }

    /// Make every statistics append fail
    pub fn fail_stats_writes(&self, fail: bool) {
        self.fail_stats_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueueStore for InMemoryStore {
    async fn find_course(&self, course_id: CourseId) -> Result<Course> {
        self.state
            .read()
            .await
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                resource: format!("Course with ID {course_id}"),
            })
    }

    async fn find_user(&self, user_id: UserId) -> Result<User> {
        self.state
            .read()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                resource: format!("User with ID {user_id}"),
            })
    }

    async fn is_staff(&self, course_id: CourseId, user_id: UserId) -> Result<bool> {
        Ok(self.state.read().await.staff.contains(&(course_id, user_id)))
    }

    async fn list_sessions(&self, course_id: CourseId) -> Result<Vec<Session>> {
        let state = self.state.read().await;
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|session| session.course_id == course_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            (a.weekday, a.start_time, &a.name).cmp(&(b.weekday, b.start_time, &b.name))
        });
        Ok(sessions)
    }

    async fn find_session(&self, course_id: CourseId, session_id: SessionId) -> Result<Session> {
        self.state
            .read()
            .await
            .sessions
            .get(&session_id)
            .filter(|session| session.course_id == course_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                resource: format!("Session with ID {session_id}"),
            })
    }

    async fn add_to_queue(&self, entry: &NewQueueEntry) -> Result<QueueEntry> {
        let mut state = self.state.write().await;

        if let Some(existing) = state
            .queue
            .iter_mut()
            .find(|q| q.course_id == entry.course_id && q.user_id == entry.user_id)
        {
            existing.session_id = entry.session_id;
            existing.location.clone_from(&entry.location);
            existing.row = entry.row;
            existing.language.clone_from(&entry.language);
            existing.call_url.clone_from(&entry.call_url);
            return Ok(existing.clone());
        }

        let stored = QueueEntry {
            id: Uuid::new_v4(),
            course_id: entry.course_id,
            session_id: entry.session_id,
            user_id: entry.user_id,
            location: entry.location.clone(),
            row: entry.row,
            language: entry.language.clone(),
            call_url: entry.call_url.clone(),
            created_at: Utc::now(),
        };
        state.queue.push(stored.clone());
        Ok(stored)
    }

    async fn remove_from_queue(&self, course_id: CourseId, user_id: UserId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.queue.len();
        state
            .queue
            .retain(|q| !(q.course_id == course_id && q.user_id == user_id));
        Ok(state.queue.len() < before)
    }

    async fn queue_for_course(&self, course_id: CourseId) -> Result<Vec<QueueRecord>> {
        let state = self.state.read().await;
        Ok(state
            .queue
            .iter()
            .filter(|q| q.course_id == course_id)
            .map(|q| {
                let (first_name, last_name) = state.user_name(q.user_id);
                QueueRecord {
                    entry: q.clone(),
                    first_name,
                    last_name,
                }
            })
            .collect())
    }

    async fn queue_length(&self, course_id: CourseId, session_id: SessionId) -> Result<usize> {
        Ok(self
            .state
            .read()
            .await
            .queue
            .iter()
            .filter(|q| q.course_id == course_id && q.session_id == session_id)
            .count())
    }

    async fn append_session_sample(
        &self,
        course_id: CourseId,
        session_id: SessionId,
        date: NaiveDate,
        sample: &str,
    ) -> Result<()> {
        if self.fail_stats_writes.load(Ordering::SeqCst) {
            return Err(Error::Database("Statistics writes are disabled".to_string()));
        }

        self.state
            .write()
            .await
            .stats
            .entry((date, session_id))
            .or_insert_with(|| SessionStats {
                course_id,
                session_id,
                date,
                samples: Vec::new(),
            })
            .samples
            .push(sample.to_string());
        Ok(())
    }

    async fn session_stats(&self, course_id: CourseId) -> Result<Vec<SessionStats>> {
        Ok(self
            .state
            .read()
            .await
            .stats
            .values()
            .filter(|stats| stats.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn add_participant(&self, participant: &NewParticipant) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.participants.iter_mut().find(|p| {
            p.session_id == participant.session_id
                && p.user_id == participant.user_id
                && p.date == participant.date
        }) {
            existing.location.clone_from(&participant.location);
            existing.signed_up |= participant.signed_up;
            return Ok(());
        }

        state.participants.push(Participant {
            id: Uuid::new_v4(),
            course_id: participant.course_id,
            session_id: participant.session_id,
            user_id: participant.user_id,
            location: participant.location.clone(),
            signed_up: participant.signed_up,
            date: participant.date,
        });
        Ok(())
    }

    async fn participants(
        &self,
        course_id: CourseId,
        session_id: Option<SessionId>,
        date: NaiveDate,
    ) -> Result<Vec<ParticipantRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<ParticipantRecord> = state
            .participants
            .iter()
            .filter(|p| {
                p.course_id == course_id
                    && p.date == date
                    && session_id.is_none_or(|id| p.session_id == id)
            })
            .map(|p| {
                let (first_name, last_name) = state.user_name(p.user_id);
                ParticipantRecord {
                    participant: p.clone(),
                    first_name,
                    last_name,
                }
            })
            .collect();
        records.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(records)
    }

    async fn participant_counts(&self, course_id: CourseId) -> Result<Vec<ParticipantCount>> {
        let state = self.state.read().await;
        let mut attendees: BTreeMap<(NaiveDate, SessionId), HashSet<UserId>> = BTreeMap::new();
        for p in state.participants.iter().filter(|p| p.course_id == course_id) {
            attendees
                .entry((p.date, p.session_id))
                .or_default()
                .insert(p.user_id);
        }

        Ok(attendees
            .into_iter()
            .map(|((date, session_id), users)| ParticipantCount {
                session_id,
                date,
                count: i64::try_from(users.len()).unwrap_or(i64::MAX),
            })
            .collect())
    }

    async fn most_frequent(&self, course_id: CourseId, limit: i64) -> Result<Vec<FrequentUser>> {
        let state = self.state.read().await;
        let mut visits: HashMap<UserId, HashSet<NaiveDate>> = HashMap::new();
        for p in state.participants.iter().filter(|p| p.course_id == course_id) {
            visits.entry(p.user_id).or_default().insert(p.date);
        }

        let mut users: Vec<FrequentUser> = visits
            .into_iter()
            .map(|(user_id, dates)| {
                let (first_name, last_name) = state.user_name(user_id);
                FrequentUser {
                    user_id,
                    first_name,
                    last_name,
                    visits: i64::try_from(dates.len()).unwrap_or(i64::MAX),
                }
            })
            .collect();
        users.sort_by(|a, b| {
            b.visits
                .cmp(&a.visits)
                .then_with(|| a.last_name.cmp(&b.last_name))
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }

    async fn save_previous_location(&self, user_id: UserId, location: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&user_id).ok_or_else(|| Error::NotFound {
            resource: format!("User with ID {user_id}"),
        })?;
        user.previous_location = Some(location.to_string());
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
