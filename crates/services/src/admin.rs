//! # Admin
//!
//! Moderation operations restricted to admin accounts. Course removal and
//! unpublishing go through the course service, which already admits admins.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use domains::models::{Role, User, UserProfile};
use domains::policy;
use domains::ports::{CourseRepo, UserRepo};
use domains::{DomainError, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_students: u64,
    pub total_tutors: u64,
    pub total_courses: u64,
    pub total_enrollments: u64,
}

pub struct AdminService {
    users: Arc<dyn UserRepo>,
    courses: Arc<dyn CourseRepo>,
}

impl AdminService {
    pub fn new(users: Arc<dyn UserRepo>, courses: Arc<dyn CourseRepo>) -> Self {
        Self { users, courses }
    }

    pub async fn stats(&self, admin: &User) -> Result<PlatformStats> {
        policy::require_admin(admin)?;
        Ok(PlatformStats {
            total_users: self.users.count(None).await?,
            total_students: self.users.count(Some(Role::Student)).await?,
            total_tutors: self.users.count(Some(Role::Tutor)).await?,
            total_courses: self.courses.count().await?,
            total_enrollments: self.courses.enrollment_count().await?,
        })
    }

    pub async fn users(&self, admin: &User, role: Option<Role>) -> Result<Vec<UserProfile>> {
        policy::require_admin(admin)?;
        let users = self.users.list(role).await?;
        Ok(users.into_iter().map(|u| u.profile()).collect())
    }

    /// Deactivated accounts fail authentication on their next request.
    pub async fn set_active(&self, admin: &User, user_id: Uuid, active: bool) -> Result<UserProfile> {
        policy::require_admin(admin)?;
        if admin.id == user_id {
            return Err(DomainError::validation(
                "You cannot deactivate your own account",
            ));
        }
        let mut user = self.require_user(user_id).await?;
        if user.role == Role::Superadmin && admin.role != Role::Superadmin {
            return Err(DomainError::forbidden("Cannot modify a superadmin account"));
        }
        user.is_active = active;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        tracing::info!(user_id = %user_id, active, changed_by = %admin.id, "account status changed");
        Ok(user.profile())
    }

    /// Marks a tutor as verified, unlocking course creation.
    pub async fn verify_tutor(&self, admin: &User, user_id: Uuid) -> Result<UserProfile> {
        policy::require_admin(admin)?;
        let mut user = self.require_user(user_id).await?;
        if user.role != Role::Tutor {
            return Err(DomainError::validation("User is not a tutor"));
        }
        user.verified_tutor = true;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        tracing::info!(user_id = %user_id, verified_by = %admin.id, "tutor verified");
        Ok(user.profile())
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }
}
