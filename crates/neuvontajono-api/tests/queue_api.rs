//! HTTP tests of the queue actions and summary

mod common;

use axum::http::{StatusCode, header};
use common::*;
use neuvontajono_core::types::REMOTE_ROW;
use neuvontajono_database::QueueStore;
use pretty_assertions::assert_eq;
use uuid::Uuid;

async fn wait_for_samples(app: &TestApp) -> Vec<String> {
    for _ in 0..100 {
        let stats = app.store.session_stats(app.course.id).await.unwrap();
        if let Some(day) = stats.into_iter().find(|s| s.session_id == app.open_session.id) {
            return day.samples;
        }
        tokio::task::yield_now().await;
    }
    Vec::new()
}

#[tokio::test]
async fn test_local_add_returns_summary() {
    let app = TestApp::new().await;
    let session_id = app.open_session.id.to_string();

    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[
            ("action", "add"),
            ("_csrf", CSRF),
            ("sessionId", &session_id),
            ("location", "A101"),
            ("row", "3"),
            ("language", "en"),
            ("participationMode", "local"),
            ("callURL", "https://meet.example.com/ada"),
        ],
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let summary = body_json(response).await;
    assert_eq!(summary["queueLength"], 1);
    assert_eq!(summary["myPosition"], 1);
    assert_eq!(summary["courseName"], "Programming 1");
    assert_eq!(summary["queue"][0]["row"], 3);
    assert_eq!(summary["queue"][0]["callURL"], "");
    assert_eq!(summary["queue"][0]["location"], "A101");
    assert_eq!(summary["queue"][0]["name"], "Ada Lovelace");
    assert_eq!(summary["sessions"][0]["name"], "Monday lab");
    assert_eq!(summary["sessions"][0]["startTime"], "10:00");

    // Joining also records attendance
    assert_eq!(summary["participants"][0]["signedUp"], false);
}

#[tokio::test]
async fn test_add_samples_queue_length() {
    let app = TestApp::new().await;
    app.join(&app.student, "A101").await;

    // 10:15 is 615 minutes after midnight
    assert_eq!(wait_for_samples(&app).await, vec!["615|1".to_string()]);
}

#[tokio::test]
async fn test_remote_add_forces_row_and_converts_link() {
    let app = TestApp::new().await;
    let session_id = app.open_session.id.to_string();

    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[
            ("action", "add"),
            ("_csrf", CSRF),
            ("sessionId", &session_id),
            ("row", "12"),
            ("participationMode", "remote"),
            ("callURL", "http://Ünïcode.example/room"),
        ],
        true,
    );
    let summary = body_json(app.send(request).await).await;

    let entry = &summary["queue"][0];
    assert_eq!(entry["row"], REMOTE_ROW);
    assert_eq!(entry["location"], "REMOTELOCATION");
    assert_eq!(entry["language"], "fi");
    let link = entry["callURL"].as_str().unwrap();
    assert!(link.starts_with("http://xn--"));
    assert!(link.ends_with("/room"));
}

#[tokio::test]
async fn test_remote_link_with_other_scheme_is_blanked() {
    let app = TestApp::new().await;
    let session_id = app.open_session.id.to_string();

    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[
            ("action", "add"),
            ("_csrf", CSRF),
            ("sessionId", &session_id),
            ("participationMode", "remote"),
            ("callURL", "ftp://x"),
        ],
        true,
    );
    let summary = body_json(app.send(request).await).await;
    assert_eq!(summary["queue"][0]["callURL"], "");
}

#[tokio::test]
async fn test_local_add_rejects_remote_row() {
    let app = TestApp::new().await;
    let session_id = app.open_session.id.to_string();

    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[
            ("action", "add"),
            ("_csrf", CSRF),
            ("sessionId", &session_id),
            ("location", "A101"),
            ("row", "-1"),
            ("participationMode", "local"),
        ],
        true,
    );
    assert!(is_rejection(&body_json(app.send(request).await).await));
    assert!(app.store.queue_for_course(app.course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_sessions_reject_every_action() {
    let app = TestApp::new().await;
    let missing = Uuid::new_v4().to_string();

    for session_id in [
        app.closed_session.id.to_string(),
        app.inactive_session.id.to_string(),
        missing,
    ] {
        for action in ["add", "signUp"] {
            let request = app.post_form(
                &app.queue_path(),
                &app.student,
                &[
                    ("action", action),
                    ("_csrf", CSRF),
                    ("sessionId", &session_id),
                    ("location", "A101"),
                    ("row", "1"),
                ],
                true,
            );
            let response = app.send(request).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(is_rejection(&body_json(response).await));
        }
    }

    assert!(app.store.queue_for_course(app.course.id).await.unwrap().is_empty());
    assert!(app
        .store
        .participants(app.course.id, None, first_monday())
        .await
        .unwrap()
        .is_empty());
    assert!(app.store.session_stats(app.course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_up_saves_previous_location() {
    let app = TestApp::new().await;
    let session_id = app.open_session.id.to_string();

    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[
            ("action", "signUp"),
            ("_csrf", CSRF),
            ("sessionId", &session_id),
            ("location", "B2"),
        ],
        true,
    );
    let summary = body_json(app.send(request).await).await;

    assert_eq!(summary["previousLocation"], "B2");
    assert_eq!(summary["queueLength"], 0);
    assert_eq!(summary["participants"][0]["signedUp"], true);
    assert_eq!(summary["participants"][0]["location"], "B2");

    let user = app.store.find_user(app.student.id).await.unwrap();
    assert_eq!(user.previous_location.as_deref(), Some("B2"));
}

#[tokio::test]
async fn test_remove_leaves_queue() {
    let app = TestApp::new().await;
    app.join(&app.student, "A101").await;
    app.join(&app.other_student, "B2").await;

    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[("action", "remove"), ("_csrf", CSRF)],
        true,
    );
    let summary = body_json(app.send(request).await).await;

    assert_eq!(summary["queueLength"], 1);
    assert!(summary["myPosition"].is_null());
    assert_eq!(summary["queue"], serde_json::json!([]));

    // Removing again is not an error
    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[("action", "remove"), ("_csrf", CSRF)],
        true,
    );
    assert!(!is_rejection(&body_json(app.send(request).await).await));
}

#[tokio::test]
async fn test_rejoining_keeps_position() {
    let app = TestApp::new().await;
    app.join(&app.student, "A101").await;
    app.join(&app.other_student, "B2").await;

    let summary = app.join(&app.student, "B2").await;
    assert_eq!(summary["myPosition"], 1);
    assert_eq!(summary["queueLength"], 2);
    assert_eq!(summary["queue"][0]["location"], "B2");
}

#[tokio::test]
async fn test_csrf_mismatch_rejected() {
    let app = TestApp::new().await;
    let session_id = app.open_session.id.to_string();

    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[
            ("action", "add"),
            ("_csrf", "forged"),
            ("sessionId", &session_id),
            ("location", "A101"),
            ("row", "1"),
        ],
        true,
    );
    assert!(is_rejection(&body_json(app.send(request).await).await));
    assert!(app.store.queue_for_course(app.course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_action_rejected() {
    let app = TestApp::new().await;
    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[("action", "jump"), ("_csrf", CSRF)],
        true,
    );
    assert!(is_rejection(&body_json(app.send(request).await).await));
}

#[tokio::test]
async fn test_page_post_redirects() {
    let app = TestApp::new().await;
    let request = app.post_form(
        &app.queue_path(),
        &app.student,
        &[("action", "remove"), ("_csrf", CSRF)],
        false,
    );
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION].to_str().unwrap(),
        app.queue_path()
    );
}

#[tokio::test]
async fn test_stats_write_failure_is_not_reported() {
    let app = TestApp::new().await;
    app.store.fail_stats_writes(true);

    let summary = app.join(&app.student, "A101").await;
    assert!(!is_rejection(&summary));
    assert_eq!(summary["queueLength"], 1);

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(app.store.session_stats(app.course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_visibility() {
    let app = TestApp::new().await;
    app.join(&app.student, "A101").await;
    app.join(&app.other_student, "B2").await;

    let path = format!("{}/summary", app.queue_path());

    let student = body_json(app.send(app.get(&path, &app.other_student, true)).await).await;
    assert_eq!(student["staff"], false);
    assert_eq!(student["queueLength"], 2);
    assert_eq!(student["myPosition"], 2);
    assert_eq!(student["queue"].as_array().unwrap().len(), 1);
    assert_eq!(student["queue"][0]["position"], 2);
    assert_eq!(student["participants"].as_array().unwrap().len(), 1);

    let teacher = body_json(app.send(app.get(&path, &app.teacher, true)).await).await;
    assert_eq!(teacher["staff"], true);
    assert!(teacher["myPosition"].is_null());
    assert_eq!(teacher["queue"][0]["name"], "Ada Lovelace");
    assert_eq!(teacher["queue"][1]["name"], "Alan Turing");
    assert_eq!(teacher["participants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_queue_page_embeds_summary() {
    let app = TestApp::new().await;
    app.join(&app.student, "A101").await;

    let response = app.send(app.get(&app.queue_path(), &app.student, false)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<title>Programming 1</title>"));
    assert!(html.contains(r#"<script id="queue-data" type="application/json">"#));
    assert!(html.contains(r#""queueLength":1"#));
    assert!(html.contains(CSRF));
}

#[tokio::test]
async fn test_authentication_context() {
    let app = TestApp::new().await;

    let anonymous = axum::http::Request::get(app.queue_path())
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(anonymous).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let other_course = format!("/course/{}/queue", Uuid::new_v4());
    let response = app.send(app.get(&other_course, &app.student, true)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
