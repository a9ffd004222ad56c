//! Chat rooms and AI conversations.
//!
//! Live messaging happens over the gateway; these routes cover room listing,
//! history, direct-room creation, moderation and the persisted AI tutor
//! conversations.

use axum::extract::{Path, State};
use axum::response::{Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use domains::models::Sender;
use services::assistant::TaskKind;

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(rooms))
        .route("/rooms/direct", post(open_direct))
        .route("/rooms/{room_id}/messages", get(history))
        .route("/messages/{message_id}", delete(delete_message))
        .route("/ai", post(create_conversation).get(conversations))
        .route("/ai/{id}", get(conversation))
        .route("/ai/{id}/message", post(converse))
}

async fn rooms(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Response> {
    let rooms = state.chat.rooms_for_user(user.id).await?;
    Ok(envelope::counted(&rooms))
}

#[derive(Deserialize)]
struct DirectBody {
    user_id: Uuid,
}

async fn open_direct(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<DirectBody>,
) -> ApiResult<Response> {
    let room = state.chat.open_direct(user.id, body.user_id).await?;
    Ok(envelope::ok(room))
}

async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<Uuid>,
) -> ApiResult<Response> {
    let messages = state.chat.history(user.id, room_id).await?;
    Ok(envelope::counted(&messages))
}

/// Moderation over HTTP mirrors the gateway event; live clients hear about
/// the removal either way.
async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
) -> ApiResult<Response> {
    let message = state.chat.delete_message(&user, message_id).await?;
    state.gateway.broadcast_deletion(&message);
    Ok(envelope::ok_message("Message deleted successfully"))
}

#[derive(Deserialize)]
struct CreateConversationBody {
    name: Option<String>,
}

async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateConversationBody>,
) -> ApiResult<Response> {
    let conversation = state.assistant.create_conversation(user.id, body.name).await?;
    Ok(envelope::created(conversation))
}

async fn conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Response> {
    let conversations = state.assistant.conversations(user.id).await?;
    Ok(envelope::counted(&conversations))
}

async fn conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let conversation = state.assistant.conversation(user.id, id).await?;
    Ok(envelope::ok(conversation))
}

#[derive(Deserialize)]
struct ConverseBody {
    content: String,
    context: Option<String>,
    #[serde(default)]
    task: TaskKind,
    reasoning_details: Option<serde_json::Value>,
}

/// One tutoring exchange: the user turn is stored, the assistant answers,
/// and the reply is stored back onto the same transcript.
async fn converse(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ConverseBody>,
) -> ApiResult<Response> {
    state
        .assistant
        .append_message(user.id, id, Sender::Human, body.content.clone())
        .await?;
    let answer = state
        .assistant
        .ask(&body.content, body.context, body.task, body.reasoning_details)
        .await?;
    let conversation = state
        .assistant
        .append_message(user.id, id, Sender::Assistant, answer.clone())
        .await?;
    Ok(envelope::ok(json!({
        "answer": answer,
        "conversation": conversation,
    })))
}
