//! Notification inbox.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_read))
        .route("/{id}/read", put(mark_read))
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct InboxQuery {
    unread: bool,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<InboxQuery>,
) -> ApiResult<Response> {
    let notifications = state.notifications.list(user.id, query.unread).await?;
    Ok(envelope::counted(&notifications))
}

async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Response> {
    let count = state.notifications.unread_count(user.id).await?;
    Ok(envelope::ok(json!({ "count": count })))
}

async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    state.notifications.mark_read(id, user.id).await?;
    Ok(envelope::ok_message("Notification marked as read"))
}

async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Response> {
    let updated = state.notifications.mark_all_read(user.id).await?;
    Ok(envelope::ok(json!({ "updated": updated })))
}
