//! Chat over REST and the socket upgrade: direct-room dedupe,
//! participant-only history, moderation and the /ws token gate.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use domains::models::Message;
use domains::ports::MessageRepo;

use crate::fixtures::TestApp;

/// Posts a message straight into the store; live sends go through the
/// gateway, which has no REST surface.
async fn seed_message(app: &TestApp, room_id: Uuid, sender_id: Uuid, content: &str) -> Uuid {
    let message = Message::new(room_id, sender_id, content.to_owned());
    let id = message.id;
    MessageRepo::insert(app.store.as_ref(), message).await.unwrap();
    id
}

#[tokio::test]
async fn direct_rooms_are_deduplicated_per_pair() {
    let app = TestApp::new();
    let (priya, priya_id) = app.register("Priya", "priya@example.com", "student").await;
    let (tunde, tunde_id) = app.register("Tunde", "tunde@example.com", "student").await;

    let (status, opened) = app
        .post("/api/chat/rooms/direct", &priya, json!({"user_id": tunde_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(opened["data"]["name"], "Direct Message");
    assert_eq!(opened["data"]["room_type"], "direct");
    let room_id = opened["data"]["id"].as_str().unwrap().to_owned();

    // The peer opening the same conversation lands in the same room.
    let (_, reopened) = app
        .post("/api/chat/rooms/direct", &tunde, json!({"user_id": priya_id}))
        .await;
    assert_eq!(reopened["data"]["id"], room_id.as_str());

    let (status, reply) = app
        .post("/api/chat/rooms/direct", &priya, json!({"user_id": priya_id}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "Cannot open a direct room with yourself");

    let ghost = Uuid::new_v4();
    let (status, reply) = app
        .post("/api/chat/rooms/direct", &priya, json!({"user_id": ghost}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["message"], format!("User not found with ID {ghost}"));
}

#[tokio::test]
async fn history_is_for_participants_only() {
    let app = TestApp::new();
    let (priya, priya_id) = app.register("Priya", "priya@example.com", "student").await;
    let (_, tunde_id) = app.register("Tunde", "tunde@example.com", "student").await;
    let (_, opened) = app
        .post("/api/chat/rooms/direct", &priya, json!({"user_id": tunde_id}))
        .await;
    let room_id: Uuid = opened["data"]["id"].as_str().unwrap().parse().unwrap();

    seed_message(&app, room_id, priya_id, "First").await;
    seed_message(&app, room_id, tunde_id, "Second").await;

    let (status, history) = app
        .get(&format!("/api/chat/rooms/{room_id}/messages"), &priya)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["count"], 2);
    // Chronological, oldest first.
    assert_eq!(history["data"][0]["content"], "First");
    assert_eq!(history["data"][1]["content"], "Second");

    let (outsider, _) = app.register("Mallory", "mallory@example.com", "student").await;
    let (status, reply) = app
        .get(&format!("/api/chat/rooms/{room_id}/messages"), &outsider)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "You are not a participant of this room");
}

#[tokio::test]
async fn enrollment_joins_the_course_group_chat() {
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
    let (_, rooms) = app.get("/api/chat/rooms", &student).await;
    assert_eq!(rooms["count"], 0);

    app.post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
        .await;
    let (_, rooms) = app.get("/api/chat/rooms", &student).await;
    assert_eq!(rooms["count"], 1);
    assert_eq!(rooms["data"][0]["name"], "Rust Fundamentals - Group Chat");
    assert_eq!(rooms["data"][0]["room_type"], "course");
}

#[tokio::test]
async fn authors_and_room_admins_delete_messages() {
    let app = TestApp::new();
    let (tutor, tutor_id) = app.verified_tutor("Amaka", "amaka@example.com").await;
    let (_, created) = app
        .post(
            "/api/courses",
            &tutor,
            json!({"title": "Rust Fundamentals", "description": "Ownership and borrowing."}),
        )
        .await;
    let course_id = created["data"]["id"].as_str().unwrap().to_owned();
    let (student, student_id) = app.register("Priya", "priya@example.com", "student").await;
    app.post(&format!("/api/courses/{course_id}/enroll"), &student, json!({}))
        .await;
    let room_id: Uuid = created["data"]["group_chat_id"].as_str().unwrap().parse().unwrap();

    // A member cannot remove the room admin's message.
    let tutor_message = seed_message(&app, room_id, tutor_id, "Welcome everyone").await;
    let (status, reply) = app
        .request(
            Method::DELETE,
            &format!("/api/chat/messages/{tutor_message}"),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["message"], "Not authorized to delete this message");

    // Authors remove their own, the room admin removes anyone's.
    let own = seed_message(&app, room_id, student_id, "oops typo").await;
    let (status, reply) = app
        .request(Method::DELETE, &format!("/api/chat/messages/{own}"), Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "Message deleted successfully");

    let spam = seed_message(&app, room_id, student_id, "buy cheap follows").await;
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/chat/messages/{spam}"), Some(&tutor), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, history) = app
        .get(&format!("/api/chat/rooms/{room_id}/messages"), &tutor)
        .await;
    let contents: Vec<&str> = history["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["Welcome everyone"]);
}

fn upgrade_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::CONNECTION, "upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_VERSION, "13")
        .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn socket_upgrades_require_a_valid_token() {
    let app = TestApp::new();

    let response = app.router.clone().oneshot(upgrade_request("/ws")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(upgrade_request("/ws?token=not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (token, _) = app.register("Priya", "priya@example.com", "student").await;
    let response = app
        .router
        .clone()
        .oneshot(upgrade_request(&format!("/ws?token={token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
}
