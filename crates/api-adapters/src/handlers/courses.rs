//! Course catalog, lifecycle, enrollment, rating and schedule.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use domains::models::CourseLevel;
use domains::ports::CourseFilter;
use domains::DomainError;
use services::courses::{CreateCourseInput, EnrollOutcome, UpdateCourseInput};

use crate::envelope;
use crate::error::ApiResult;
use crate::extract::{AuthUser, OptionalAuthUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(remove))
        .route("/{id}/enroll", post(enroll))
        .route("/{id}/rating", post(rate))
        .route("/{id}/schedule", get(schedule))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogQuery {
    category: Option<String>,
    level: Option<CourseLevel>,
    tutor: Option<Uuid>,
    search: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl CatalogQuery {
    fn into_filter(self) -> CourseFilter {
        let defaults = CourseFilter::default();
        CourseFilter {
            category: self.category,
            level: self.level,
            tutor_id: self.tutor,
            search: self.search,
            min_price: self.min_price,
            max_price: self.max_price,
            page: self.page.unwrap_or(defaults.page).max(1),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, 100),
            ..defaults
        }
    }
}

/// Public catalog; published courses only.
async fn list(State(state): State<AppState>, Query(query): Query<CatalogQuery>) -> ApiResult<Response> {
    let filter = query.into_filter();
    let (page, limit) = (filter.page, filter.limit);
    let (courses, total) = state.courses.list(filter).await?;
    Ok(envelope::listing(&courses, total, page, limit))
}

async fn detail(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let (course, is_enrolled) = state.courses.get(id, viewer.map(|u| u.id)).await?;
    let mut data = serde_json::to_value(&course).map_err(|e| DomainError::internal(e))?;
    data["isEnrolled"] = json!(is_enrolled);
    Ok(envelope::ok(data))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateCourseInput>,
) -> ApiResult<Response> {
    let course = state.courses.create(&user, input).await?;
    Ok(envelope::created(course))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCourseInput>,
) -> ApiResult<Response> {
    let course = state.courses.update(&user, id, input).await?;
    Ok(envelope::ok(course))
}

async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    state.courses.delete(&user, id).await?;
    Ok(envelope::ok_message("Course deleted successfully"))
}

async fn enroll(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    match state.courses.enroll(&user, id).await? {
        EnrollOutcome::Enrolled(course) => Ok(Json(json!({
            "success": true,
            "message": "Enrolled successfully",
            "data": course,
        }))
        .into_response()),
        // Enrollment on paid courses waits for payment confirmation; nothing
        // has been mutated at this point.
        EnrollOutcome::PaymentRequired { amount, currency } => Ok(Json(json!({
            "success": true,
            "requiresPayment": true,
            "amount": amount,
            "currency": currency,
            "message": "Please complete payment to enroll",
        }))
        .into_response()),
    }
}

#[derive(Deserialize)]
struct RatingBody {
    rating: u8,
    review: Option<String>,
}

async fn rate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RatingBody>,
) -> ApiResult<Response> {
    let average = state
        .courses
        .rate(&user, id, body.rating, body.review)
        .await?;
    Ok(envelope::ok(json!({ "averageRating": average })))
}

async fn schedule(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let (course_title, slots) = state.courses.schedule(&user, id).await?;
    Ok(envelope::ok(json!({
        "courseTitle": course_title,
        "schedule": slots,
    })))
}
