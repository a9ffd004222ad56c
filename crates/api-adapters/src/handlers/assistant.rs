//! AI tutor endpoints: free-form questions plus the structured study tools.

use axum::extract::State;
use axum::response::{Json, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use services::assistant::{StudyPlanInput, TaskKind};

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask))
        .route("/summarize", post(summarize))
        .route("/recommend", post(recommend))
        .route("/resources", post(resources))
        .route("/study-plan", post(study_plan))
        .route("/pre-grade", post(pre_grade))
        .route("/analyze", post(analyze))
}

#[derive(Deserialize)]
struct AskBody {
    question: String,
    context: Option<String>,
    #[serde(default)]
    task: TaskKind,
    reasoning_details: Option<serde_json::Value>,
}

async fn ask(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(body): Json<AskBody>,
) -> ApiResult<Response> {
    let answer = state
        .assistant
        .ask(&body.question, body.context, body.task, body.reasoning_details)
        .await?;
    Ok(envelope::ok(json!({ "answer": answer })))
}

#[derive(Deserialize)]
struct SummarizeBody {
    transcript: String,
}

async fn summarize(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(body): Json<SummarizeBody>,
) -> ApiResult<Response> {
    let summary = state.assistant.summarize(&body.transcript).await?;
    Ok(envelope::ok(json!({ "summary": summary })))
}

#[derive(Deserialize)]
struct RecommendBody {
    course_id: Uuid,
}

/// Never fails: an unusable model answer degrades to stock recommendations.
async fn recommend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<RecommendBody>,
) -> ApiResult<Response> {
    let recommendations = state
        .assistant
        .study_recommendations(&user, body.course_id)
        .await;
    Ok(envelope::ok(recommendations))
}

#[derive(Deserialize)]
struct ResourcesBody {
    course_id: Uuid,
    current_topic: Option<String>,
}

async fn resources(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(body): Json<ResourcesBody>,
) -> ApiResult<Response> {
    let resources = state
        .assistant
        .resource_recommendations(body.course_id, body.current_topic)
        .await?;
    Ok(envelope::ok(resources))
}

async fn study_plan(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(input): Json<StudyPlanInput>,
) -> ApiResult<Response> {
    let plan = state.assistant.study_plan(input).await?;
    Ok(envelope::ok(plan))
}

#[derive(Deserialize)]
struct PreGradeBody {
    submission_id: Uuid,
}

async fn pre_grade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<PreGradeBody>,
) -> ApiResult<Response> {
    let report = state.assistant.pre_grade(&user, body.submission_id).await?;
    Ok(envelope::ok(report))
}

async fn analyze(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Response> {
    let analysis = state.assistant.analyze_performance(&user).await?;
    Ok(envelope::ok(analysis))
}
