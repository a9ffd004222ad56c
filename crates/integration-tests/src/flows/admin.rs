//! Platform administration: the admin-only gate, stats, account
//! moderation and tutor verification.

use axum::http::{Method, StatusCode};
use serde_json::json;

use domains::models::{Role, User};
use domains::ports::UserRepo;

use crate::fixtures::TestApp;

#[tokio::test]
async fn the_admin_surface_is_admin_only() {
    let app = TestApp::new();
    let (student, student_id) = app.register("Priya", "priya@example.com", "student").await;

    for uri in ["/api/admin/stats", "/api/admin/users"] {
        let (status, reply) = app.get(uri, &student).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "open admin route: {uri}");
        assert_eq!(reply["message"], "Admin access required");
    }

    let (status, _) = app
        .put(
            &format!("/api/admin/users/{student_id}/active"),
            &student,
            json!({"active": false}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stats_count_users_courses_and_enrollments() {
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
    for (name, email) in [("Priya", "priya@example.com"), ("Tunde", "tunde@example.com")] {
        let (student, _) = app.register(name, email, "student").await;
        app.post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
            .await;
    }
    let (admin, _) = app.admin("admin@example.com").await;

    let (status, reply) = app.get("/api/admin/stats", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"]["totalUsers"], 4);
    assert_eq!(reply["data"]["totalStudents"], 2);
    assert_eq!(reply["data"]["totalTutors"], 1);
    assert_eq!(reply["data"]["totalCourses"], 1);
    assert_eq!(reply["data"]["totalEnrollments"], 2);
}

#[tokio::test]
async fn user_listing_filters_by_role() {
    let app = TestApp::new();
    app.register("Priya", "priya@example.com", "student").await;
    app.register("Tunde", "tunde@example.com", "student").await;
    app.register("Jonas", "jonas@example.com", "tutor").await;
    let (admin, _) = app.admin("admin@example.com").await;

    let (_, all) = app.get("/api/admin/users", &admin).await;
    assert_eq!(all["count"], 4);

    let (_, students) = app.get("/api/admin/users?role=student", &admin).await;
    assert_eq!(students["count"], 2);
    for user in students["data"].as_array().unwrap() {
        assert_eq!(user["role"], "student");
        assert!(user.get("password_hash").is_none());
    }
}

#[tokio::test]
async fn deactivation_locks_the_account_out() {
    let app = TestApp::new();
    let (student, student_id) = app.register("Priya", "priya@example.com", "student").await;
    let (admin, admin_id) = app.admin("admin@example.com").await;

    let (status, reply) = app
        .put(
            &format!("/api/admin/users/{admin_id}/active"),
            &admin,
            json!({"active": false}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "You cannot deactivate your own account");

    let (status, reply) = app
        .put(
            &format!("/api/admin/users/{student_id}/active"),
            &admin,
            json!({"active": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"]["is_active"], false);

    // Both the live token and fresh logins are refused.
    let (status, reply) = app.get("/api/auth/me", &student).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Account is deactivated");
    let login = json!({"email": "priya@example.com", "password": "password123"});
    let (status, _) = app
        .request(Method::POST, "/api/auth/login", None, Some(login.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Reactivation restores access.
    app.put(
        &format!("/api/admin/users/{student_id}/active"),
        &admin,
        json!({"active": true}),
    )
    .await;
    let (status, _) = app.request(Method::POST, "/api/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn superadmin_accounts_are_off_limits() {
    let app = TestApp::new();
    let (admin, _) = app.admin("admin@example.com").await;
    let root = User::new(
        "Root".to_owned(),
        "root@example.com".to_owned(),
        "unused-hash".to_owned(),
        Role::Superadmin,
    );
    let root_id = root.id;
    UserRepo::insert(app.store.as_ref(), root).await.unwrap();

    let (status, reply) = app
        .put(
            &format!("/api/admin/users/{root_id}/active"),
            &admin,
            json!({"active": false}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Cannot modify a superadmin account");
}

#[tokio::test]
async fn verification_unlocks_course_creation() {
    let app = TestApp::new();
    let (tutor, tutor_id) = app.register("Jonas", "jonas@example.com", "tutor").await;
    let (_, student_id) = app.register("Priya", "priya@example.com", "student").await;
    let (admin, _) = app.admin("admin@example.com").await;
    let course = json!({"title": "Databases", "description": "Tables and queries."});

    let (status, _) = app.post("/api/courses", &tutor, course.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reply) = app
        .put(&format!("/api/admin/tutors/{student_id}/verify"), &admin, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "User is not a tutor");

    let (status, reply) = app
        .put(&format!("/api/admin/tutors/{tutor_id}/verify"), &admin, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"]["verified_tutor"], true);

    let (status, _) = app.post("/api/courses", &tutor, course).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn admins_take_down_courses() {
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
    let (admin, _) = app.admin("admin@example.com").await;

    let (status, reply) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/courses/{course_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "Course deleted successfully");

    let (status, _) = app
        .request(Method::GET, &format!("/api/courses/{course_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
