//! Catalog and enrollment behavior: the verified-tutor gate, search and
//! pagination, the free/paid enrollment split, ratings and schedules.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::fixtures::TestApp;

/// Creates a course through the API as `token` and returns its id.
async fn create_course(app: &TestApp, token: &str, body: serde_json::Value) -> String {
    let (status, created) = app.post("/api/courses", token, body).await;
    assert_eq!(status, StatusCode::CREATED, "course create failed: {created}");
    created["data"]["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn course_creation_is_gated_on_tutor_verification() {
    let app = TestApp::new();
    let body = json!({"title": "Intro to Databases", "description": "Tables and queries."});

    let (student, _) = app.register("Priya", "priya@example.com", "student").await;
    let (status, reply) = app.post("/api/courses", &student, body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "This action requires the tutor role");

    let (unverified, _) = app.register("Jonas", "jonas@example.com", "tutor").await;
    let (status, reply) = app.post("/api/courses", &unverified, body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Only verified tutors can create courses");

    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let (status, reply) = app.post("/api/courses", &tutor, body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["data"]["title"], "Intro to Databases");
    // Catalog defaults: free, published, NGN.
    assert_eq!(reply["data"]["price"], 0.0);
    assert_eq!(reply["data"]["currency"], "NGN");
    assert_eq!(reply["data"]["is_published"], true);
}

#[tokio::test]
async fn blank_title_or_description_is_rejected() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;

    let (status, reply) = app
        .post("/api/courses", &tutor, json!({"title": "  ", "description": "x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Please provide title and description");
}

#[tokio::test]
async fn creating_a_course_opens_its_group_chat() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let course_id = create_course(
        &app,
        &tutor,
        json!({"title": "Rust Fundamentals", "description": "Ownership and borrowing."}),
    )
    .await;

    // The tutor is seeded into the room as its admin.
    let (status, rooms) = app.get("/api/chat/rooms", &tutor).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = rooms["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Rust Fundamentals - Group Chat"), "rooms: {names:?}");

    // And the course carries the back-reference.
    let (_, detail) = app
        .request(Method::GET, &format!("/api/courses/{course_id}"), None, None)
        .await;
    assert!(detail["data"]["group_chat_id"].is_string());
}

#[tokio::test]
async fn catalog_search_and_pagination() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    for (title, category) in [
        ("Systems Programming in Rust", "programming"),
        ("Watercolor Painting", "art"),
        ("Rust Web Services", "programming"),
    ] {
        create_course(
            &app,
            &tutor,
            json!({"title": title, "description": "A full course.", "category": category}),
        )
        .await;
    }

    // Search is case-insensitive over title, description and tags.
    let (status, page) = app
        .request(Method::GET, "/api/courses?search=RUST", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 2);
    assert_eq!(page["total"], 2);

    let (_, page) = app
        .request(Method::GET, "/api/courses?category=art", None, None)
        .await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["data"][0]["title"], "Watercolor Painting");

    let (_, page) = app
        .request(Method::GET, "/api/courses?limit=1&page=2", None, None)
        .await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["total"], 3);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["currentPage"], 2);
}

#[tokio::test]
async fn free_enrollment_is_capped_and_not_repeatable() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let course_id = create_course(
        &app,
        &tutor,
        json!({"title": "Tiny Seminar", "description": "One seat only.", "max_students": 1}),
    )
    .await;
    let enroll_uri = format!("/api/courses/{course_id}/enroll");

    let (first, _) = app.register("Priya", "priya@example.com", "student").await;
    let (status, reply) = app.post(&enroll_uri, &first, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "Enrolled successfully");
    assert_eq!(reply["data"]["enrolled_students"].as_array().unwrap().len(), 1);

    let (status, reply) = app.post(&enroll_uri, &first, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "You are already enrolled in this course");

    let (second, _) = app.register("Tunde", "tunde@example.com", "student").await;
    let (status, reply) = app.post(&enroll_uri, &second, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Course is full");
}

#[tokio::test]
async fn paid_courses_defer_to_payment_without_enrolling() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let course_id = create_course(
        &app,
        &tutor,
        json!({
            "title": "Advanced Data Engineering",
            "description": "Pipelines at scale.",
            "price": 15000.0,
        }),
    )
    .await;

    let (student, _) = app.register("Priya", "priya@example.com", "student").await;
    let (status, reply) = app
        .post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["requiresPayment"], true);
    assert_eq!(reply["amount"], 15000.0);
    assert_eq!(reply["currency"], "NGN");
    assert_eq!(reply["message"], "Please complete payment to enroll");

    // Nothing was mutated while payment is pending.
    let (_, detail) = app.get(&format!("/api/courses/{course_id}"), &student).await;
    assert_eq!(detail["data"]["isEnrolled"], false);
    assert_eq!(detail["data"]["enrolled_students"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn ratings_require_enrollment_and_average_out() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let course_id = create_course(
        &app,
        &tutor,
        json!({"title": "Rust Fundamentals", "description": "Ownership and borrowing."}),
    )
    .await;
    let enroll_uri = format!("/api/courses/{course_id}/enroll");
    let rating_uri = format!("/api/courses/{course_id}/rating");

    let (outsider, _) = app.register("Mallory", "mallory@example.com", "student").await;
    let (status, reply) = app.post(&rating_uri, &outsider, json!({"rating": 5})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "You must be enrolled to rate this course");

    let (first, _) = app.register("Priya", "priya@example.com", "student").await;
    let (second, _) = app.register("Tunde", "tunde@example.com", "student").await;
    app.post(&enroll_uri, &first, json!({})).await;
    app.post(&enroll_uri, &second, json!({})).await;

    let (status, reply) = app.post(&rating_uri, &first, json!({"rating": 6})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Rating must be between 1 and 5");

    let (status, reply) = app
        .post(&rating_uri, &first, json!({"rating": 5, "review": "Loved it"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"]["averageRating"], 5.0);

    let (_, reply) = app.post(&rating_uri, &second, json!({"rating": 4})).await;
    assert_eq!(reply["data"]["averageRating"], 4.5);

    // Re-rating replaces the earlier entry instead of adding a second one.
    let (_, reply) = app.post(&rating_uri, &first, json!({"rating": 3})).await;
    assert_eq!(reply["data"]["averageRating"], 3.5);
    let (_, detail) = app.get(&format!("/api/courses/{course_id}"), &first).await;
    assert_eq!(detail["data"]["ratings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn schedule_is_for_members_only() {
    let app = TestApp::new();
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let course_id = create_course(
        &app,
        &tutor,
        json!({
            "title": "Rust Fundamentals",
            "description": "Ownership and borrowing.",
            "schedule": [
                {"day": "monday", "start_time": "18:00", "end_time": "19:30", "topic": "Ownership"},
                {"day": "thursday", "start_time": "18:00", "end_time": "19:30"},
            ],
        }),
    )
    .await;
    let schedule_uri = format!("/api/courses/{course_id}/schedule");

    let (outsider, _) = app.register("Mallory", "mallory@example.com", "student").await;
    let (status, reply) = app.get(&schedule_uri, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Not authorized to view this schedule");

    let (student, _) = app.register("Priya", "priya@example.com", "student").await;
    app.post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
        .await;
    let (status, reply) = app.get(&schedule_uri, &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"]["courseTitle"], "Rust Fundamentals");
    assert_eq!(reply["data"]["schedule"].as_array().unwrap().len(), 2);
    assert_eq!(reply["data"]["schedule"][0]["day"], "monday");

    // The owning tutor reads it too.
    let (status, _) = app.get(&schedule_uri, &tutor).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn course_management_is_owner_or_admin_only() {
    let app = TestApp::new();
    let (owner, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let course_id = create_course(
        &app,
        &owner,
        json!({"title": "Rust Fundamentals", "description": "Ownership and borrowing."}),
    )
    .await;
    let course_uri = format!("/api/courses/{course_id}");

    let (rival, _) = app.verified_tutor("Jonas", "jonas@example.com").await;
    let (status, reply) = app
        .put(&course_uri, &rival, json!({"title": "Hijacked"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Only the course tutor can perform this action");

    let (status, reply) = app
        .put(&course_uri, &owner, json!({"title": "Rust, Properly"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"]["title"], "Rust, Properly");

    let (status, reply) = app
        .request(Method::DELETE, &course_uri, Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "Course deleted successfully");

    let (status, reply) = app.request(Method::GET, &course_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        reply["message"],
        format!("Course not found with ID {course_id}")
    );
}
