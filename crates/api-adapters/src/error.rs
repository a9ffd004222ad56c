//! # ApiError
//!
//! Translates [`DomainError`] into HTTP statuses and the `{success, message}`
//! error body clients expect. Internal details are logged, never exposed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use domains::DomainError;

pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

/// The status and client-facing message for a domain failure. Shared with
/// the realtime gateway, which sends the message over the socket instead.
pub(crate) fn status_and_message(err: &DomainError) -> (StatusCode, String) {
    match err {
        DomainError::NotFound(..) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        DomainError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        DomainError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        DomainError::AlreadyEnrolled => (
            StatusCode::BAD_REQUEST,
            "You are already enrolled in this course".to_owned(),
        ),
        DomainError::CourseFull => (StatusCode::BAD_REQUEST, "Course is full".to_owned()),
        DomainError::DeadlinePassed => (
            StatusCode::BAD_REQUEST,
            "Submission deadline has passed and late submissions are not allowed".to_owned(),
        ),
        DomainError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        DomainError::Internal(msg) => {
            tracing::error!(error = %msg, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = status_and_message(&self.0);
        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}
