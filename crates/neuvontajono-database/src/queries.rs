//! PostgreSQL query operations for the help queue

use crate::models::{
    CourseDb, FrequentUserDb, ParticipantCountDb, ParticipantDb, QueueEntryDb, SessionDb,
    SessionStatsDb, UserDb,
};
use chrono::NaiveDate;
use neuvontajono_core::{
    Error, Result,
    types::{NewParticipant, NewQueueEntry, Session},
};
use sqlx::PgPool;
use uuid::Uuid;

fn not_found(resource: String) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| match e {
        sqlx::Error::RowNotFound => Error::NotFound { resource },
        _ => Error::Database(e.to_string()),
    }
}

/// Course and user lookups
pub struct CourseQueries;

impl CourseQueries {
    /// Find course by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the course does not exist.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<CourseDb> {
        sqlx::query_as::<_, CourseDb>("SELECT id, name FROM courses WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(not_found(format!("Course with ID {id}")))
    }

    /// Find user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the user does not exist.
    pub async fn find_user(pool: &PgPool, id: Uuid) -> Result<UserDb> {
        sqlx::query_as::<_, UserDb>(
            "SELECT id, first_name, last_name, email, previous_location FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(not_found(format!("User with ID {id}")))
    }

    /// Whether the user is staff on the course
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_staff(pool: &PgPool, course_id: Uuid, user_id: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM course_staff WHERE course_id = $1 AND user_id = $2)",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    /// Store the user's latest sign-up location
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the user does not exist.
    pub async fn update_previous_location(
        pool: &PgPool,
        user_id: Uuid,
        location: &str,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE users SET previous_location = $2 WHERE id = $1")
            .bind(user_id)
            .bind(location)
            .execute(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                resource: format!("User with ID {user_id}"),
            });
        }
        Ok(())
    }
}

/// Session lookups
pub struct SessionQueries;

impl SessionQueries {
    const COLUMNS: &'static str = "id, course_id, name, locations, language, weekday, \
        start_time, end_time, start_date, end_date, active";

    /// List sessions of a course
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row holds out-of-range values.
    pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Session>> {
        let query = format!(
            "SELECT {} FROM sessions WHERE course_id = $1 ORDER BY weekday, start_time, name",
            Self::COLUMNS
        );

        sqlx::query_as::<_, SessionDb>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .into_iter()
            .map(Session::try_from)
            .collect()
    }

    /// Find a session of the course
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the session does not belong to the course.
    pub async fn find(pool: &PgPool, course_id: Uuid, session_id: Uuid) -> Result<Session> {
        let query = format!(
            "SELECT {} FROM sessions WHERE id = $1 AND course_id = $2",
            Self::COLUMNS
        );

        let row = sqlx::query_as::<_, SessionDb>(&query)
            .bind(session_id)
            .bind(course_id)
            .fetch_one(pool)
            .await
            .map_err(not_found(format!("Session with ID {session_id}")))?;

        Session::try_from(row)
    }
}

/// Queue operations
pub struct QueueQueries;

impl QueueQueries {
    /// Insert or update the user's queue entry
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn upsert(pool: &PgPool, entry: &NewQueueEntry) -> Result<QueueEntryDb> {
        let query = r"
            INSERT INTO queue_entries (
                course_id, session_id, user_id, location, seat_row, language, call_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (course_id, user_id) DO UPDATE SET
                session_id = EXCLUDED.session_id,
                location = EXCLUDED.location,
                seat_row = EXCLUDED.seat_row,
                language = EXCLUDED.language,
                call_url = EXCLUDED.call_url
            RETURNING id, course_id, session_id, user_id, location, seat_row,
                language, call_url, created_at
        ";

        sqlx::query_as::<_, QueueEntryDb>(query)
            .bind(entry.course_id)
            .bind(entry.session_id)
            .bind(entry.user_id)
            .bind(&entry.location)
            .bind(entry.row)
            .bind(&entry.language)
            .bind(&entry.call_url)
            .fetch_one(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Delete the user's queue entry
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn delete(pool: &PgPool, course_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM queue_entries WHERE course_id = $1 AND user_id = $2")
            .bind(course_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Queue of a course in joining order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<QueueEntryDb>> {
        let query = r"
            SELECT q.id, q.course_id, q.session_id, q.user_id, q.location, q.seat_row,
                q.language, q.call_url, q.created_at, u.first_name, u.last_name
            FROM queue_entries q
            JOIN users u ON u.id = q.user_id
            WHERE q.course_id = $1
            ORDER BY q.created_at, q.id
        ";

        sqlx::query_as::<_, QueueEntryDb>(query)
            .bind(course_id)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Number of entries queued for a session
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_by_session(pool: &PgPool, course_id: Uuid, session_id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM queue_entries WHERE course_id = $1 AND session_id = $2",
        )
        .bind(course_id)
        .bind(session_id)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}

/// Attendance operations
pub struct ParticipantQueries;

impl ParticipantQueries {
    /// Insert or merge an attendance record
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn upsert(pool: &PgPool, participant: &NewParticipant) -> Result<()> {
        let query = r"
            INSERT INTO participants (course_id, session_id, user_id, location, signed_up, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (session_id, user_id, date) DO UPDATE SET
                location = EXCLUDED.location,
                signed_up = participants.signed_up OR EXCLUDED.signed_up
        ";

        sqlx::query(query)
            .bind(participant.course_id)
            .bind(participant.session_id)
            .bind(participant.user_id)
            .bind(&participant.location)
            .bind(participant.signed_up)
            .bind(participant.date)
            .execute(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// Attendees of a course on a date
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_on_date(
        pool: &PgPool,
        course_id: Uuid,
        session_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Vec<ParticipantDb>> {
        let query = r"
            SELECT p.id, p.course_id, p.session_id, p.user_id, p.location, p.signed_up,
                p.date, u.first_name, u.last_name
            FROM participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.course_id = $1
                AND p.date = $2
                AND ($3::uuid IS NULL OR p.session_id = $3)
            ORDER BY u.last_name, u.first_name, p.created_at
        ";

        sqlx::query_as::<_, ParticipantDb>(query)
            .bind(course_id)
            .bind(date)
            .bind(session_id)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Distinct attendees per session occurrence
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn counts(pool: &PgPool, course_id: Uuid) -> Result<Vec<ParticipantCountDb>> {
        let query = r"
            SELECT session_id, date, COUNT(DISTINCT user_id) AS count
            FROM participants
            WHERE course_id = $1
            GROUP BY session_id, date
            ORDER BY date, session_id
        ";

        sqlx::query_as::<_, ParticipantCountDb>(query)
            .bind(course_id)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Users ordered by distinct attended dates
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn most_frequent(
        pool: &PgPool,
        course_id: Uuid,
        limit: i64,
    ) -> Result<Vec<FrequentUserDb>> {
        let query = r"
            SELECT p.user_id, u.first_name, u.last_name, COUNT(DISTINCT p.date) AS visits
            FROM participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.course_id = $1
            GROUP BY p.user_id, u.first_name, u.last_name
            ORDER BY visits DESC, u.last_name, u.first_name
            LIMIT $2
        ";

        sqlx::query_as::<_, FrequentUserDb>(query)
            .bind(course_id)
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}

/// Queue length statistics
pub struct StatsQueries;

impl StatsQueries {
    /// Append a sample to the occurrence's series
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn append_sample(
        pool: &PgPool,
        course_id: Uuid,
        session_id: Uuid,
        date: NaiveDate,
        sample: &str,
    ) -> Result<()> {
        let query = r"
            INSERT INTO session_stats (course_id, session_id, date, samples)
            VALUES ($1, $2, $3, ARRAY[$4::text])
            ON CONFLICT (session_id, date) DO UPDATE SET
                samples = array_append(session_stats.samples, $4::text)
        ";

        sqlx::query(query)
            .bind(course_id)
            .bind(session_id)
            .bind(date)
            .bind(sample)
            .execute(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// All statistics of a course
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<SessionStatsDb>> {
        sqlx::query_as::<_, SessionStatsDb>(
            "SELECT course_id, session_id, date, samples FROM session_stats \
             WHERE course_id = $1 ORDER BY date, session_id",
        )
        .bind(course_id)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use pretty_assertions::assert_eq;

    async fn create_test_pool() -> Option<PgPool> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        match PgPool::connect(&database_url).await {
            Ok(pool) => {
                if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                    eprintln!("Failed to migrate test database: {e}");
                    return None;
                }
                Some(pool)
            }
            Err(e) => {
                eprintln!("Failed to connect to database: {e}");
                None
            }
        }
    }

    struct Fixture {
        course_id: Uuid,
        session_id: Uuid,
        user_id: Uuid,
    }

    async fn seed(pool: &PgPool) -> Result<Fixture> {
        let course_id: Uuid =
            sqlx::query_scalar("INSERT INTO courses (name) VALUES ('Programming 1') RETURNING id")
                .fetch_one(pool)
                .await
                .map_err(|e| Error::Database(e.to_string()))?;

        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email) VALUES ('Ada', 'Lovelace', $1) RETURNING id",
        )
        .bind(format!("{}@example.com", Uuid::new_v4()))
        .fetch_one(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        let today = chrono::Local::now().date_naive();
        let session_id: Uuid = sqlx::query_scalar(
            r"INSERT INTO sessions (course_id, name, locations, language, weekday,
                start_time, end_time, start_date, end_date)
              VALUES ($1, 'Lab', ARRAY['A101'], 'en', $2, 0, 1440, $3, $3) RETURNING id",
        )
        .bind(course_id)
        .bind(i16::try_from(today.weekday().num_days_from_monday()).unwrap())
        .bind(today)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(Fixture {
            course_id,
            session_id,
            user_id,
        })
    }

    fn entry(fixture: &Fixture, location: &str) -> NewQueueEntry {
        NewQueueEntry {
            course_id: fixture.course_id,
            session_id: fixture.session_id,
            user_id: fixture.user_id,
            location: location.to_string(),
            row: 2,
            language: "en".to_string(),
            call_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_queue_upsert_keeps_position() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };
        let fixture = seed(&pool).await?;

        let first = QueueQueries::upsert(&pool, &entry(&fixture, "A101")).await?;
        let second = QueueQueries::upsert(&pool, &entry(&fixture, "B202")).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.location, "B202");
        assert_eq!(
            QueueQueries::count_by_session(&pool, fixture.course_id, fixture.session_id).await?,
            1
        );

        let queue = QueueQueries::list_by_course(&pool, fixture.course_id).await?;
        assert_eq!(queue[0].first_name, "Ada");

        assert!(QueueQueries::delete(&pool, fixture.course_id, fixture.user_id).await?);
        assert!(!QueueQueries::delete(&pool, fixture.course_id, fixture.user_id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_stats_samples_append_in_order() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };
        let fixture = seed(&pool).await?;
        let today = chrono::Local::now().date_naive();

        StatsQueries::append_sample(&pool, fixture.course_id, fixture.session_id, today, "600|1")
            .await?;
        StatsQueries::append_sample(&pool, fixture.course_id, fixture.session_id, today, "610|2")
            .await?;

        let stats = StatsQueries::list_by_course(&pool, fixture.course_id).await?;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].samples, vec!["600|1".to_string(), "610|2".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_participant_signed_up_sticks() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };
        let fixture = seed(&pool).await?;
        let today = chrono::Local::now().date_naive();
        let mut participant = NewParticipant {
            course_id: fixture.course_id,
            session_id: fixture.session_id,
            user_id: fixture.user_id,
            location: "A101".to_string(),
            signed_up: true,
            date: today,
        };

        ParticipantQueries::upsert(&pool, &participant).await?;
        participant.signed_up = false;
        ParticipantQueries::upsert(&pool, &participant).await?;

        let rows =
            ParticipantQueries::list_on_date(&pool, fixture.course_id, Some(fixture.session_id), today)
                .await?;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].signed_up);

        let counts = ParticipantQueries::counts(&pool, fixture.course_id).await?;
        assert_eq!(counts[0].count, 1);

        let frequent = ParticipantQueries::most_frequent(&pool, fixture.course_id, 10).await?;
        assert_eq!(frequent[0].visits, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };
        let fixture = seed(&pool).await?;

        let result = SessionQueries::find(&pool, fixture.course_id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
