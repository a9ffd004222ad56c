//! Notification inbox: enrollment and assignment events landing there,
//! unread filtering and the owner-scoped read flags.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::fixtures::TestApp;

/// Student enrolled in a course with one published assignment: two unread
/// notifications in the inbox.
async fn busy_inbox(app: &TestApp) -> (String, String) {
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let (_, created) = app
        .post(
            "/api/courses",
            &tutor,
            json!({"title": "Rust Fundamentals", "description": "Ownership and borrowing."}),
        )
        .await;
    let course_id = created["data"]["id"].as_str().unwrap().to_owned();
    let (student, _) = app.register("Priya", "priya@example.com", "student").await;
    app.post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
        .await;
    app.post(
        "/api/assignments",
        &tutor,
        json!({
            "course_id": course_id,
            "title": "Ownership Basics",
            "description": "Explain moves and borrows.",
            "due_date": (Utc::now() + Duration::weeks(1)).to_rfc3339(),
        }),
    )
    .await;
    (student, course_id)
}

#[tokio::test]
async fn enrollment_confirmations_land_in_the_inbox() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let (_, created) = app
        .post(
            "/api/courses",
            &tutor,
            json!({"title": "Rust Fundamentals", "description": "Ownership and borrowing."}),
        )
        .await;
    let course_id = created["data"]["id"].as_str().unwrap().to_owned();
    let (student, _) = app.register("Priya", "priya@example.com", "student").await;
    app.post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
        .await;

    let (status, inbox) = app.get("/api/notifications", &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox["count"], 1);
    let confirmation = &inbox["data"][0];
    assert_eq!(confirmation["kind"], "course_enrollment");
    assert_eq!(confirmation["title"], "Course Enrollment Successful");
    assert_eq!(
        confirmation["message"],
        "You have successfully enrolled in Rust Fundamentals"
    );
    assert_eq!(confirmation["priority"], "normal");
    assert_eq!(confirmation["is_read"], false);
    assert_eq!(confirmation["metadata"]["courseId"], course_id);
}

#[tokio::test]
async fn unread_filtering_tracks_the_read_flag() {
    let app = TestApp::new();
    let (student, _) = busy_inbox(&app).await;

    let (_, count) = app.get("/api/notifications/unread-count", &student).await;
    assert_eq!(count["data"]["count"], 2);

    let (_, inbox) = app.get("/api/notifications", &student).await;
    let first_id = inbox["data"][0]["id"].as_str().unwrap().to_owned();

    let (status, reply) = app
        .put(&format!("/api/notifications/{first_id}/read"), &student, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "Notification marked as read");

    let (_, unread) = app.get("/api/notifications?unread=true", &student).await;
    assert_eq!(unread["count"], 1);
    // The full inbox keeps showing read entries.
    let (_, everything) = app.get("/api/notifications", &student).await;
    assert_eq!(everything["count"], 2);
    let (_, count) = app.get("/api/notifications/unread-count", &student).await;
    assert_eq!(count["data"]["count"], 1);
}

#[tokio::test]
async fn read_flags_are_owner_scoped() {
    let app = TestApp::new();
    let (student, _) = busy_inbox(&app).await;
    let (_, inbox) = app.get("/api/notifications", &student).await;
    let id = inbox["data"][0]["id"].as_str().unwrap().to_owned();

    let (snoop, _) = app.register("Mallory", "mallory@example.com", "student").await;
    let (status, reply) = app
        .put(&format!("/api/notifications/{id}/read"), &snoop, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["message"], format!("Notification not found with ID {id}"));

    // Still unread for the real owner.
    let (_, count) = app.get("/api/notifications/unread-count", &student).await;
    assert_eq!(count["data"]["count"], 2);
}

#[tokio::test]
async fn read_all_reports_how_many_changed() {
    let app = TestApp::new();
    let (student, _) = busy_inbox(&app).await;

    let (status, reply) = app.put("/api/notifications/read-all", &student, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"]["updated"], 2);

    let (_, reply) = app.put("/api/notifications/read-all", &student, json!({})).await;
    assert_eq!(reply["data"]["updated"], 0);
    let (_, count) = app.get("/api/notifications/unread-count", &student).await;
    assert_eq!(count["data"]["count"], 0);
}
