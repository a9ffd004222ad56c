//! Platform administration: stats, user moderation, tutor verification.

use axum::extract::{Path, Query, State};
use axum::response::{Json, Response};
use axum::routing::{delete, get, put};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use domains::models::Role;

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(users))
        .route("/users/{id}/active", put(set_active))
        .route("/tutors/{id}/verify", put(verify_tutor))
        .route("/courses/{id}", delete(remove_course))
}

async fn stats(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Response> {
    let stats = state.admin.stats(&user).await?;
    Ok(envelope::ok(stats))
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct UsersQuery {
    role: Option<Role>,
}

async fn users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<UsersQuery>,
) -> ApiResult<Response> {
    let users = state.admin.users(&user, query.role).await?;
    Ok(envelope::counted(&users))
}

#[derive(Deserialize)]
struct ActiveBody {
    active: bool,
}

async fn set_active(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ActiveBody>,
) -> ApiResult<Response> {
    let profile = state.admin.set_active(&user, id, body.active).await?;
    Ok(envelope::ok(profile))
}

async fn verify_tutor(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let profile = state.admin.verify_tutor(&user, id).await?;
    Ok(envelope::ok(profile))
}

/// Admins pass the course-manager policy, so removal goes through the same
/// path tutors use for their own courses.
async fn remove_course(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    state.courses.delete(&user, id).await?;
    Ok(envelope::ok_message("Course deleted successfully"))
}
