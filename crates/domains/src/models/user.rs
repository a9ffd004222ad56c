use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform role. `Superadmin` exists for operational takeover only; policy
/// treats it as an admin everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Admin,
    Superadmin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        })
    }
}

/// Per-user delivery preferences consulted by the notification dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub push_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            push_enabled: true,
        }
    }
}

/// A registered account. Never hard-deleted; moderation toggles `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique login identity
    pub email: String,
    /// Argon2 PHC string; never serialized to API responses
    pub password_hash: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Set by an admin once a tutor's credentials are reviewed
    pub verified_tutor: bool,
    pub is_active: bool,
    pub email_verified: bool,
    /// Course ids the user is enrolled in (students only in practice)
    pub enrolled_courses: Vec<Uuid>,
    #[serde(default)]
    pub settings: NotificationSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            bio: None,
            avatar_url: None,
            verified_tutor: false,
            is_active: true,
            email_verified: false,
            enrolled_courses: Vec::new(),
            settings: NotificationSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Display identity embedded into enriched listings (submissions, ratings).
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            avatar_url: self.avatar_url.clone(),
            verified_tutor: self.verified_tutor,
        }
    }

    /// Full account view minus the credential hash; the shape every auth
    /// endpoint returns.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            bio: self.bio.clone(),
            avatar_url: self.avatar_url.clone(),
            verified_tutor: self.verified_tutor,
            is_active: self.is_active,
            email_verified: self.email_verified,
            enrolled_courses: self.enrolled_courses.clone(),
            settings: self.settings.clone(),
            created_at: self.created_at,
        }
    }
}

/// Everything a user may see about their own account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub verified_tutor: bool,
    pub is_active: bool,
    pub email_verified: bool,
    pub enrolled_courses: Vec<Uuid>,
    pub settings: NotificationSettings,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user; safe to embed in any response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub verified_tutor: bool,
}
