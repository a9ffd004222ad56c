//! # HTTP handlers
//!
//! One module per resource. Each exposes a `routes()` fragment that the
//! crate root nests under `/api`; handlers stay thin and defer every
//! decision to the services layer.

use domains::DomainError;

pub mod admin;
pub mod assignments;
pub mod assistant;
pub mod auth;
pub mod chat;
pub mod courses;
pub mod feed;
pub mod meta;
pub mod notifications;

pub(crate) fn multipart_error(error: axum::extract::multipart::MultipartError) -> DomainError {
    DomainError::validation(format!("Invalid upload: {error}"))
}
