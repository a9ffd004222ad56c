//! Assignment lifecycle: creation, submission (multipart) and grading.

use axum::extract::{Multipart, Path, State};
use axum::response::{Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use services::assignments::{CreateAssignmentInput, SubmitInput, UploadedFile};

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/course/{course_id}", get(list_for_course))
        .route("/my-submissions", get(my_submissions))
        .route("/{id}", get(detail))
        .route("/{id}/submit", post(submit))
        .route("/{id}/submissions", get(submissions))
        .route("/submission/{id}/grade", put(grade))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateAssignmentInput>,
) -> ApiResult<Response> {
    let assignment = state.assignments.create(&user, input).await?;
    Ok(envelope::created(assignment))
}

async fn list_for_course(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Response> {
    let assignments = state.assignments.list_for_course(course_id).await?;
    Ok(envelope::counted(&assignments))
}

/// The assignment plus, for students, their own submission so far.
async fn detail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let (assignment, submission) = state.assignments.get(&user, id).await?;
    Ok(envelope::ok(json!({
        "assignment": assignment,
        "submission": submission,
    })))
}

async fn submit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut files = Vec::new();
    let mut text = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(super::multipart_error)?
    {
        match field.name() {
            Some("files") => {
                let file_name = field.file_name().unwrap_or("upload").to_owned();
                let content_type = field
                    .content_type()
                    .and_then(|value| value.parse::<mime::Mime>().ok())
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM);
                let data = field.bytes().await.map_err(super::multipart_error)?.to_vec();
                files.push(UploadedFile {
                    data,
                    file_name,
                    content_type,
                });
            }
            Some("text") => {
                text = Some(field.text().await.map_err(super::multipart_error)?);
            }
            _ => {}
        }
    }

    let submission = state
        .assignments
        .submit(&user, id, SubmitInput { files, text })
        .await?;
    Ok(envelope::created(submission))
}

/// Every submission for the assignment; course managers only.
async fn submissions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let views = state.assignments.submissions(&user, id).await?;
    Ok(envelope::counted(&views))
}

#[derive(Deserialize)]
struct GradeBody {
    score: f64,
    feedback: Option<String>,
}

async fn grade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<GradeBody>,
) -> ApiResult<Response> {
    let submission = state
        .assignments
        .grade(&user, id, body.score, body.feedback)
        .await?;
    Ok(envelope::ok(submission))
}

async fn my_submissions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Response> {
    let views = state.assignments.my_submissions(&user).await?;
    Ok(envelope::counted(&views))
}
