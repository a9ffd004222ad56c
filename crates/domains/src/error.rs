//! # DomainError
//!
//! Centralized error handling for the EduBridge domain. Maps business-rule
//! failures to actionable error types; the API layer owns the translation to
//! HTTP statuses.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Referenced entity absent (e.g. Course, Assignment, Submission)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Malformed or missing input
    #[error("validation error: {0}")]
    Validation(String),

    /// No (valid) credentials presented
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not allowed to perform the action
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Student is already a member of the course
    #[error("already enrolled in this course")]
    AlreadyEnrolled,

    /// Enrollment cap reached
    #[error("course is full")]
    CourseFull,

    /// Deadline passed and the assignment disallows late submissions
    #[error("submission deadline has passed and late submissions are not allowed")]
    DeadlinePassed,

    /// AI / mail / blob-store collaborator failure
    #[error("upstream service error: {0}")]
    Upstream(String),

    /// Infrastructure failure inside an adapter
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound(entity, id.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn upstream(msg: impl std::fmt::Display) -> Self {
        Self::Upstream(msg.to_string())
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }
}

/// A specialized Result type for EduBridge domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;
