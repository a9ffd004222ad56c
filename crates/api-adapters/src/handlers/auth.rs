//! Registration, login and profile self-service.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use domains::models::NotificationSettings;
use services::accounts::{AuthSession, ProfilePatch, RegisterInput};

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .route("/settings", put(update_settings))
        .route("/upload-avatar", post(upload_avatar))
}

/// Token alongside the profile, at the top level of the body. Clients read
/// `token` directly rather than digging through `data`.
fn session_response(status: StatusCode, session: AuthSession) -> Response {
    (
        status,
        Json(json!({
            "success": true,
            "token": session.token,
            "user": session.user,
        })),
    )
        .into_response()
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<Response> {
    let session = state.accounts.register(input).await?;
    Ok(session_response(StatusCode::CREATED, session))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> ApiResult<Response> {
    let session = state.accounts.login(&body.email, &body.password).await?;
    Ok(session_response(StatusCode::OK, session))
}

/// Tokens are stateless, so logout is client-side; the route exists for
/// clients that want an explicit end to the session.
async fn logout(AuthUser(_user): AuthUser) -> Response {
    envelope::ok_message("User logged out successfully")
}

async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Response> {
    let profile = state.accounts.profile(user.id).await?;
    Ok(envelope::ok(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(patch): Json<ProfilePatch>,
) -> ApiResult<Response> {
    let profile = state.accounts.update_profile(user.id, patch).await?;
    Ok(envelope::ok(profile))
}

#[derive(Deserialize)]
struct PasswordBody {
    current_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<PasswordBody>,
) -> ApiResult<Response> {
    state
        .accounts
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;
    Ok(envelope::ok_message("Password updated successfully"))
}

async fn update_settings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(settings): Json<NotificationSettings>,
) -> ApiResult<Response> {
    let profile = state.accounts.update_settings(user.id, settings).await?;
    Ok(envelope::ok(profile))
}

async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(super::multipart_error)?
    {
        if field.name() != Some("avatar") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("avatar").to_owned();
        let content_type = field
            .content_type()
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .unwrap_or(mime::IMAGE_PNG);
        let data = field.bytes().await.map_err(super::multipart_error)?.to_vec();
        let profile = state
            .accounts
            .upload_avatar(user.id, data, &file_name, &content_type)
            .await?;
        return Ok(envelope::ok(profile));
    }
    Err(domains::DomainError::validation("Please provide an image file").into())
}
