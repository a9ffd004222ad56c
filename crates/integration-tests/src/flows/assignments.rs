//! Assignment workflow end to end: publishing with fan-out, multipart
//! submission, the single-record resubmission rule and penalty grading.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::fixtures::{Part, TestApp};

struct Classroom {
    tutor: String,
    student: String,
    course_id: String,
}

/// Verified tutor with one free course and one enrolled student.
async fn classroom(app: &TestApp) -> Classroom {
    let (tutor, _) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let (status, created) = app
        .post(
            "/api/courses",
            &tutor,
            json!({"title": "Rust Fundamentals", "description": "Ownership and borrowing."}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let course_id = created["data"]["id"].as_str().unwrap().to_owned();

    let (student, _) = app.register("Priya", "priya@example.com", "student").await;
    let (status, _) = app
        .post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    Classroom { tutor, student, course_id }
}

/// Publishes an assignment in the classroom and returns its id.
async fn publish(app: &TestApp, room: &Classroom, extra: serde_json::Value) -> String {
    let mut body = json!({
        "course_id": room.course_id,
        "title": "Ownership Basics",
        "description": "Explain moves and borrows.",
        "due_date": (Utc::now() + Duration::weeks(1)).to_rfc3339(),
    });
    body.as_object_mut()
        .unwrap()
        .extend(extra.as_object().unwrap().clone());
    let (status, created) = app.post("/api/assignments", &room.tutor, body).await;
    assert_eq!(status, StatusCode::CREATED, "assignment create failed: {created}");
    created["data"]["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn assignment_creation_is_for_the_owning_tutor() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let body = json!({
        "course_id": room.course_id,
        "title": "Ownership Basics",
        "description": "Explain moves and borrows.",
        "due_date": (Utc::now() + Duration::weeks(1)).to_rfc3339(),
    });

    let (status, reply) = app.post("/api/assignments", &room.student, body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Not authorized to create assignments for this course");

    let (rival, _) = app.verified_tutor("Jonas", "jonas@example.com").await;
    let (status, _) = app.post("/api/assignments", &rival, body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reply) = app
        .post(
            "/api/assignments",
            &room.tutor,
            json!({
                "course_id": room.course_id,
                "title": "Ownership Basics",
                "description": "Explain moves and borrows.",
                "due_date": (Utc::now() + Duration::weeks(1)).to_rfc3339(),
                "late_submission_penalty": 150,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Late submission penalty must be between 0 and 100");
}

#[tokio::test]
async fn publishing_notifies_every_enrolled_student() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let (second, _) = app.register("Tunde", "tunde@example.com", "student").await;
    app.post(&format!("/api/courses/{}/enroll", room.course_id), &second, json!({}))
        .await;

    let assignment_id = publish(&app, &room, json!({})).await;

    for token in [&room.student, &second] {
        let (status, inbox) = app.get("/api/notifications", token).await;
        assert_eq!(status, StatusCode::OK);
        let published: Vec<&serde_json::Value> = inbox["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["title"] == "New Assignment Posted")
            .collect();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0]["message"],
            "New assignment \"Ownership Basics\" has been posted in Rust Fundamentals"
        );
        assert_eq!(published[0]["priority"], "high");
        assert_eq!(published[0]["metadata"]["assignmentId"], assignment_id);
    }

    // The catalog listing for the course sees it too.
    let (_, listed) = app
        .get(&format!("/api/assignments/course/{}", room.course_id), &room.student)
        .await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["title"], "Ownership Basics");
}

#[tokio::test]
async fn submission_requires_enrollment_and_content() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let assignment_id = publish(&app, &room, json!({})).await;
    let submit_uri = format!("/api/assignments/{assignment_id}/submit");

    let (outsider, _) = app.register("Mallory", "mallory@example.com", "student").await;
    let (status, reply) = app
        .post_multipart(&submit_uri, &outsider, &[Part::Text { name: "text", value: "hi" }])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "You must be enrolled in the course to submit assignments");

    let (status, reply) = app
        .post_multipart(&submit_uri, &room.student, &[Part::Text { name: "text", value: "   " }])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Please provide files or text to submit");

    let too_many: Vec<Part<'_>> = (0..6)
        .map(|_| Part::File {
            name: "files",
            file_name: "notes.txt",
            content_type: "text/plain",
            data: b"notes",
        })
        .collect();
    let (status, reply) = app.post_multipart(&submit_uri, &room.student, &too_many).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "At most 5 files per submission");

    let (status, reply) = app
        .post_multipart(
            &submit_uri,
            &room.student,
            &[Part::Text { name: "text", value: "Moves transfer ownership." }],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["data"]["attempt_number"], 1);
    assert_eq!(reply["data"]["status"], "submitted");
    assert_eq!(reply["data"]["is_late"], false);

    // The owning tutor hears about it.
    let (_, inbox) = app.get("/api/notifications", &room.tutor).await;
    let titles: Vec<&str> = inbox["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"New Assignment Submission"), "inbox: {titles:?}");
}

#[tokio::test]
async fn resubmission_patches_the_single_record() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let assignment_id = publish(&app, &room, json!({})).await;
    let submit_uri = format!("/api/assignments/{assignment_id}/submit");

    app.post_multipart(
        &submit_uri,
        &room.student,
        &[Part::Text { name: "text", value: "First draft." }],
    )
    .await;
    let (status, reply) = app
        .post_multipart(
            &submit_uri,
            &room.student,
            &[Part::File {
                name: "files",
                file_name: "essay.md",
                content_type: "text/markdown",
                data: b"# Ownership\n",
            }],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["data"]["attempt_number"], 2);
    // Patch semantics: the file attempt keeps the earlier text.
    assert_eq!(reply["data"]["text"], "First draft.");
    assert_eq!(reply["data"]["files"].as_array().unwrap().len(), 1);
    assert_eq!(reply["data"]["files"][0]["file_name"], "essay.md");

    let (_, listed) = app
        .get(&format!("/api/assignments/{assignment_id}/submissions"), &room.tutor)
        .await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["student"]["name"], "Priya");
}

#[tokio::test]
async fn missed_deadlines_block_submission_unless_allowed() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let assignment_id = publish(
        &app,
        &room,
        json!({"due_date": (Utc::now() - Duration::days(1)).to_rfc3339()}),
    )
    .await;

    let (status, reply) = app
        .post_multipart(
            &format!("/api/assignments/{assignment_id}/submit"),
            &room.student,
            &[Part::Text { name: "text", value: "Too late." }],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply["message"],
        "Submission deadline has passed and late submissions are not allowed"
    );
}

#[tokio::test]
async fn late_submissions_take_the_grading_penalty() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let assignment_id = publish(
        &app,
        &room,
        json!({
            "due_date": (Utc::now() - Duration::days(1)).to_rfc3339(),
            "allow_late_submission": true,
            "late_submission_penalty": 20,
        }),
    )
    .await;

    let (status, reply) = app
        .post_multipart(
            &format!("/api/assignments/{assignment_id}/submit"),
            &room.student,
            &[Part::Text { name: "text", value: "Better late." }],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["data"]["is_late"], true);
    let submission_id = reply["data"]["id"].as_str().unwrap().to_owned();

    // 20% off the raw 80.
    let (status, graded) = app
        .put(
            &format!("/api/assignments/submission/{submission_id}/grade"),
            &room.tutor,
            json!({"score": 80.0, "feedback": "Solid, but late."}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["data"]["score"], 64.0);
    assert_eq!(graded["data"]["status"], "graded");

    let (_, inbox) = app.get("/api/notifications", &room.student).await;
    let titles: Vec<&str> = inbox["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Assignment Graded"), "inbox: {titles:?}");
}

#[tokio::test]
async fn grades_are_bounded_and_tutor_only() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let assignment_id = publish(&app, &room, json!({})).await;
    let (_, submitted) = app
        .post_multipart(
            &format!("/api/assignments/{assignment_id}/submit"),
            &room.student,
            &[Part::Text { name: "text", value: "Moves transfer ownership." }],
        )
        .await;
    let submission_id = submitted["data"]["id"].as_str().unwrap().to_owned();
    let grade_uri = format!("/api/assignments/submission/{submission_id}/grade");

    let (rival, _) = app.verified_tutor("Jonas", "jonas@example.com").await;
    let (status, reply) = app.put(&grade_uri, &rival, json!({"score": 50.0})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Not authorized to grade this submission");

    let (status, reply) = app.put(&grade_uri, &room.tutor, json!({"score": 120.0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Score cannot exceed 100");

    let (status, reply) = app.put(&grade_uri, &room.tutor, json!({"score": -5.0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Score cannot be negative");

    // Failed attempts left the submission untouched.
    let (_, detail) = app
        .get(&format!("/api/assignments/{assignment_id}"), &room.student)
        .await;
    assert_eq!(detail["data"]["submission"]["status"], "submitted");
    assert!(detail["data"]["submission"]["score"].is_null());

    let (status, graded) = app
        .put(&grade_uri, &room.tutor, json!({"score": 91.5, "feedback": "Nice work"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["data"]["score"], 91.5);
    assert_eq!(graded["data"]["feedback"], "Nice work");
}

#[tokio::test]
async fn students_see_their_own_submissions_only() {
    let app = TestApp::new();
    let room = classroom(&app).await;
    let assignment_id = publish(&app, &room, json!({})).await;
    app.post_multipart(
        &format!("/api/assignments/{assignment_id}/submit"),
        &room.student,
        &[Part::Text { name: "text", value: "Moves transfer ownership." }],
    )
    .await;

    // The tutor roster view is off-limits to students.
    let (status, reply) = app
        .get(&format!("/api/assignments/{assignment_id}/submissions"), &room.student)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Not authorized to view these submissions");

    let (status, mine) = app.get("/api/assignments/my-submissions", &room.student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["count"], 1);
    assert_eq!(mine["data"][0]["assignment"]["title"], "Ownership Basics");
    assert_eq!(mine["data"][0]["assignment"]["course_title"], "Rust Fundamentals");

    // Tutors fetch the assignment without a student submission attached.
    let (_, detail) = app
        .get(&format!("/api/assignments/{assignment_id}"), &room.tutor)
        .await;
    assert!(detail["data"]["submission"].is_null());
    assert_eq!(detail["data"]["assignment"]["title"], "Ownership Basics");
}
