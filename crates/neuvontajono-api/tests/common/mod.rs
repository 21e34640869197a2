//! Common test utilities for the HTTP tests

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use chrono::{NaiveDate, NaiveDateTime};
use neuvontajono_api::{AppState, router_with_state};
use neuvontajono_core::{
    Config,
    types::{Course, NewParticipant, Session, User},
};
use neuvontajono_database::{InMemoryStore, QueueStore};
use std::sync::{Arc, Once};
use tower::ServiceExt;
use uuid::Uuid;

/// CSRF token forwarded for every test user
pub const CSRF: &str = "test-token";

static INIT: Once = Once::new();

/// Initialize test logging once
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Monday 2 September 2024
pub fn first_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

/// Monday 2 September 2024 at 10:15, inside the open session's window
pub fn now() -> NaiveDateTime {
    first_monday().and_hms_opt(10, 15, 0).unwrap()
}

/// Router over an in-memory store with a fixed clock and seeded course
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub course: Course,
    /// Monday 10:00-12:00, open at [`now`]
    pub open_session: Session,
    /// Tuesday 10:00-12:00, not held at [`now`]
    pub closed_session: Session,
    /// Monday 10:00-12:00 but deactivated
    pub inactive_session: Session,
    pub student: User,
    pub other_student: User,
    pub teacher: User,
}

fn session(course_id: Uuid, name: &str, weekday: u8, active: bool) -> Session {
    Session {
        id: Uuid::new_v4(),
        course_id,
        name: name.to_string(),
        locations: vec!["A101".to_string(), "B2".to_string()],
        language: "fi".to_string(),
        weekday,
        start_time: 600,
        end_time: 720,
        start_date: first_monday(),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 10).unwrap(),
        active,
    }
}

fn user(first: &str, last: &str) -> User {
    User {
        id: Uuid::new_v4(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}@example.com", first.to_lowercase()),
        previous_location: None,
    }
}

impl TestApp {
    /// Seed a course with three sessions, two students and a teacher
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Same as [`TestApp::new`] with custom configuration
    pub async fn with_config(mut config: Config) -> Self {
        init_test_logging();
        config.database.url = "memory:".to_string();

        let store = Arc::new(InMemoryStore::new());
        let course = Course {
            id: Uuid::new_v4(),
            name: "Programming 1".to_string(),
        };
        let open_session = session(course.id, "Monday lab", 0, true);
        let closed_session = session(course.id, "Tuesday lab", 1, true);
        let inactive_session = session(course.id, "Cancelled lab", 0, false);
        let student = user("Ada", "Lovelace");
        let other_student = user("Alan", "Turing");
        let teacher = user("Grace", "Hopper");

        store.insert_course(course.clone()).await;
        for s in [&open_session, &closed_session, &inactive_session] {
            store.insert_session(s.clone()).await;
        }
        for u in [&student, &other_student, &teacher] {
            store.insert_user(u.clone()).await;
        }
        store.add_staff(course.id, teacher.id).await;

        let shared: Arc<dyn QueueStore> = store.clone();
        let state = AppState::new(config, shared).with_clock(Arc::new(now));
        let router = router_with_state(state).unwrap();

        Self {
            router,
            store,
            course,
            open_session,
            closed_session,
            inactive_session,
            student,
            other_student,
            teacher,
        }
    }

    pub fn queue_path(&self) -> String {
        format!("/course/{}/queue", self.course.id)
    }

    pub fn statistics_path(&self) -> String {
        format!("/course/{}/statistics", self.course.id)
    }

    /// Send a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// GET as `user`
    pub fn get(&self, path: &str, user: &User, xhr: bool) -> Request<Body> {
        let mut builder = Request::get(path)
            .header("x-user-id", user.id.to_string())
            .header("x-csrf-token", CSRF);
        if xhr {
            builder = builder.header("x-requested-with", "XMLHttpRequest");
        }
        builder.body(Body::empty()).unwrap()
    }

    /// Form POST as `user`
    pub fn post_form(
        &self,
        path: &str,
        user: &User,
        fields: &[(&str, &str)],
        xhr: bool,
    ) -> Request<Body> {
        let mut builder = Request::post(path)
            .header("x-user-id", user.id.to_string())
            .header("x-csrf-token", CSRF)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if xhr {
            builder = builder.header("x-requested-with", "XMLHttpRequest");
        }
        let body = serde_urlencoded::to_string(fields).unwrap();
        builder.body(Body::from(body)).unwrap()
    }

    /// Join the open session's queue locally as `user`
    pub async fn join(&self, user: &User, location: &str) -> serde_json::Value {
        let session_id = self.open_session.id.to_string();
        let request = self.post_form(
            &self.queue_path(),
            user,
            &[
                ("action", "add"),
                ("_csrf", CSRF),
                ("sessionId", &session_id),
                ("location", location),
                ("row", "2"),
                ("language", "fi"),
                ("participationMode", "local"),
            ],
            true,
        );
        body_json(self.send(request).await).await
    }

    /// Record attendance directly in the store
    pub async fn attend(&self, user: &User, session: &Session, date: NaiveDate, location: &str) {
        self.store
            .add_participant(&NewParticipant {
                course_id: self.course.id,
                session_id: session.id,
                user_id: user.id,
                location: location.to_string(),
                signed_up: true,
                date,
            })
            .await
            .unwrap();
    }
}

/// Read the body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read the body as text
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Whether the body is the generic rejection
pub fn is_rejection(json: &serde_json::Value) -> bool {
    json == &serde_json::json!({ "error": true })
}
