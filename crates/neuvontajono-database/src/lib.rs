//! Persistence for the neuvontajono help queue

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod memory;
pub mod models;
pub mod queries;
pub mod store;

pub use memory::InMemoryStore;
pub use store::{FrequentUser, ParticipantCount, ParticipantRecord, QueueRecord, QueueStore};

use async_trait::async_trait;
use chrono::NaiveDate;
use neuvontajono_core::{
    Config, CourseId, Error, Result, SessionId, UserId,
    types::{Course, NewParticipant, NewQueueEntry, QueueEntry, Session, SessionStats, User},
};
use queries::{CourseQueries, ParticipantQueries, QueueQueries, SessionQueries, StatsQueries};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::info;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection cannot be established.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
            .idle_timeout(Duration::from_secs(config.database.idle_timeout))
            .connect(&config.database.url)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail to run.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Migration failed: {e}")))?;

        Ok(())
    }
}

/// Open the store selected by `config.database.url`
///
/// A `memory:` URL gives an empty [`InMemoryStore`]; anything else connects to
/// PostgreSQL and runs pending migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or migrated.
pub async fn connect(config: &Config) -> Result<Arc<dyn QueueStore>> {
    if config.database.is_in_memory() {
        info!("Using in-memory queue store");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let database = Database::new(config).await?;
    database.migrate().await?;
    info!("Database connected and migrated");
    Ok(Arc::new(database))
}

#[async_trait]
impl QueueStore for Database {
    async fn find_course(&self, course_id: CourseId) -> Result<Course> {
        CourseQueries::find_by_id(&self.pool, course_id)
            .await
            .map(Course::from)
    }

    async fn find_user(&self, user_id: UserId) -> Result<User> {
        CourseQueries::find_user(&self.pool, user_id)
            .await
            .map(User::from)
    }

    async fn is_staff(&self, course_id: CourseId, user_id: UserId) -> Result<bool> {
        CourseQueries::is_staff(&self.pool, course_id, user_id).await
    }

    async fn list_sessions(&self, course_id: CourseId) -> Result<Vec<Session>> {
        SessionQueries::list_by_course(&self.pool, course_id).await
    }

    async fn find_session(&self, course_id: CourseId, session_id: SessionId) -> Result<Session> {
        SessionQueries::find(&self.pool, course_id, session_id).await
    }

    async fn add_to_queue(&self, entry: &NewQueueEntry) -> Result<QueueEntry> {
        QueueQueries::upsert(&self.pool, entry)
            .await
            .map(|row| QueueRecord::from(row).entry)
    }

    async fn remove_from_queue(&self, course_id: CourseId, user_id: UserId) -> Result<bool> {
        QueueQueries::delete(&self.pool, course_id, user_id).await
    }

    async fn queue_for_course(&self, course_id: CourseId) -> Result<Vec<QueueRecord>> {
        let rows = QueueQueries::list_by_course(&self.pool, course_id).await?;
        Ok(rows.into_iter().map(QueueRecord::from).collect())
    }

    async fn queue_length(&self, course_id: CourseId, session_id: SessionId) -> Result<usize> {
        let count = QueueQueries::count_by_session(&self.pool, course_id, session_id).await?;
        usize::try_from(count).map_err(|e| Error::Database(e.to_string()))
    }

    async fn append_session_sample(
        &self,
        course_id: CourseId,
        session_id: SessionId,
        date: NaiveDate,
        sample: &str,
    ) -> Result<()> {
        StatsQueries::append_sample(&self.pool, course_id, session_id, date, sample).await
    }

    async fn session_stats(&self, course_id: CourseId) -> Result<Vec<SessionStats>> {
        let rows = StatsQueries::list_by_course(&self.pool, course_id).await?;
        Ok(rows.into_iter().map(SessionStats::from).collect())
    }

    async fn add_participant(&self, participant: &NewParticipant) -> Result<()> {
        ParticipantQueries::upsert(&self.pool, participant).await
    }

    async fn participants(
        &self,
        course_id: CourseId,
        session_id: Option<SessionId>,
        date: NaiveDate,
    ) -> Result<Vec<ParticipantRecord>> {
        let rows = ParticipantQueries::list_on_date(&self.pool, course_id, session_id, date).await?;
        Ok(rows.into_iter().map(ParticipantRecord::from).collect())
    }

    async fn participant_counts(&self, course_id: CourseId) -> Result<Vec<ParticipantCount>> {
        let rows = ParticipantQueries::counts(&self.pool, course_id).await?;
        Ok(rows.into_iter().map(ParticipantCount::from).collect())
    }

    async fn most_frequent(&self, course_id: CourseId, limit: i64) -> Result<Vec<FrequentUser>> {
        let rows = ParticipantQueries::most_frequent(&self.pool, course_id, limit).await?;
        Ok(rows.into_iter().map(FrequentUser::from).collect())
    }

    async fn save_previous_location(&self, user_id: UserId, location: &str) -> Result<()> {
        CourseQueries::update_previous_location(&self.pool, user_id, location).await
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Health check failed: {e}")))?;

        Ok(())
    }
}
