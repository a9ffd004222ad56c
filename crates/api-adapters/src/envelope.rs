//! # Response envelopes
//!
//! Every JSON body carries `success`; listings add pagination metadata so
//! clients can render page controls without a second request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;

pub fn ok<T: Serialize>(data: T) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

pub fn ok_message(message: &str) -> Response {
    Json(json!({ "success": true, "message": message })).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

/// Unpaginated collection: `count` is simply the number of items returned.
pub fn counted<T: Serialize>(items: &[T]) -> Response {
    Json(json!({
        "success": true,
        "count": items.len(),
        "data": items,
    }))
    .into_response()
}

/// Paginated collection. `count` is the page size, `total` the overall
/// number of matches.
pub fn listing<T: Serialize>(items: &[T], total: u64, page: u32, limit: u32) -> Response {
    Json(json!({
        "success": true,
        "count": items.len(),
        "total": total,
        "totalPages": total_pages(total, limit),
        "currentPage": page,
        "data": items,
    }))
    .into_response()
}

fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}
