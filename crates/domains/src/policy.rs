//! # Policy
//!
//! Pure authorization rules. Every function takes already-loaded documents
//! and answers one question; services call these before mutating anything so
//! the rules stay testable without storage.

use uuid::Uuid;

use crate::error::{DomainError, Result};
use crate::models::{ChatRoom, Course, ParticipantRole, Role, User};

/// Admins and superadmins pass; everyone else is rejected.
pub fn require_admin(user: &User) -> Result<()> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden("Admin access required"))
    }
}

pub fn require_role(user: &User, role: Role) -> Result<()> {
    if user.role == role || user.role.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "This action requires the {role} role"
        )))
    }
}

/// The owning tutor manages their course; admins manage any course.
pub fn require_course_manager(user: &User, course: &Course) -> Result<()> {
    if course.tutor_id == user.id || user.role.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(
            "Only the course tutor can perform this action",
        ))
    }
}

/// Enrolled students, the owning tutor and admins may read course-scoped
/// material (assignments, schedule, group chat).
pub fn require_course_access(user: &User, course: &Course) -> Result<()> {
    if course.is_enrolled(user.id) || course.tutor_id == user.id || user.role.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(
            "You must be enrolled in this course",
        ))
    }
}

pub fn require_enrolled(user: &User, course: &Course) -> Result<()> {
    if course.is_enrolled(user.id) {
        Ok(())
    } else {
        Err(DomainError::forbidden(
            "You must be enrolled in this course",
        ))
    }
}

pub fn require_participant(room: &ChatRoom, user_id: Uuid) -> Result<()> {
    if room.is_participant(user_id) {
        Ok(())
    } else {
        Err(DomainError::forbidden(
            "You are not a participant of this room",
        ))
    }
}

/// Authors delete their own messages; room admins delete anyone's.
pub fn can_delete_message(room: &ChatRoom, user_id: Uuid, sender_id: Uuid) -> bool {
    user_id == sender_id || matches!(room.participant_role(user_id), Some(ParticipantRole::Admin))
}

/// Post authors and platform admins may remove a feed post.
pub fn can_remove_post(user: &User, author_id: Uuid) -> bool {
    user.id == author_id || user.role.is_admin()
}
