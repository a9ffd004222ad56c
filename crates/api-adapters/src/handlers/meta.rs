//! Welcome page, health probe and the 404 fallback.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde_json::json;

pub async fn welcome() -> Response {
    Json(json!({
        "success": true,
        "message": "Welcome to the EduBridge API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "courses": "/api/courses",
            "assignments": "/api/assignments",
            "chat": "/api/chat",
            "ai": "/api/ai",
            "notifications": "/api/notifications",
            "feeds": "/api/feeds",
            "admin": "/api/admin",
        },
        "documentation": "/api/docs",
    }))
    .into_response()
}

pub async fn health() -> Response {
    Json(json!({
        "status": "OK",
        "message": "EduBridge API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
        .into_response()
}
