//! Community feed: posts with likes, comments and an optional image.

use axum::extract::{Multipart, Path, Query, State};
use axum::response::{Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use domains::DomainError;
use services::feed::DEFAULT_FEED_PAGE_SIZE;

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comments", post(comment))
        .route("/{id}", axum::routing::delete(remove))
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FeedQuery {
    page: u32,
    limit: u32,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Response> {
    let page = state.feed.list(query.page, query.limit).await?;
    let limit = if query.limit == 0 {
        DEFAULT_FEED_PAGE_SIZE
    } else {
        query.limit
    };
    Ok(envelope::listing(&page.posts, page.total, page.page, limit))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut content = None;
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(super::multipart_error)?
    {
        match field.name() {
            Some("content") => {
                content = Some(field.text().await.map_err(super::multipart_error)?);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or("image").to_owned();
                let content_type = field
                    .content_type()
                    .and_then(|value| value.parse::<mime::Mime>().ok())
                    .unwrap_or(mime::IMAGE_JPEG);
                let data = field.bytes().await.map_err(super::multipart_error)?.to_vec();
                image = Some((data, file_name, content_type));
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| DomainError::validation("Post content is required"))?;
    let post = state.feed.create(user.id, content, image).await?;
    Ok(envelope::created(post))
}

async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let post = state.feed.toggle_like(user.id, id).await?;
    Ok(envelope::ok(post))
}

#[derive(Deserialize)]
struct CommentBody {
    content: String,
}

async fn comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> ApiResult<Response> {
    let post = state.feed.comment(user.id, id, body.content).await?;
    Ok(envelope::ok(post))
}

async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    state.feed.delete(&user, id).await?;
    Ok(envelope::ok_message("Post deleted successfully"))
}
