//! # Accounts
//!
//! Registration, login and self-service profile management. Password material
//! never leaves this module unhashed; tokens are opaque strings issued by the
//! auth adapter.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use domains::models::{NotificationSettings, Role, User, UserProfile};
use domains::ports::{CredentialHasher, FileStore, TokenAuthority, UserRepo};
use domains::{DomainError, Result};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
}

/// Token plus the profile it belongs to; what register and login hand back.
#[derive(Debug)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

pub struct AccountService {
    users: Arc<dyn UserRepo>,
    files: Arc<dyn FileStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenAuthority>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        files: Arc<dyn FileStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenAuthority>,
    ) -> Self {
        Self {
            users,
            files,
            hasher,
            tokens,
        }
    }

    /// Creates an account and signs the caller in. Only student and tutor
    /// self-registration is open; tutors start unverified.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession> {
        let name = input.name.trim();
        let email = input.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || input.password.is_empty() {
            return Err(DomainError::validation(
                "Please provide name, email and password",
            ));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("Please provide a valid email"));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let role = match input.role.unwrap_or(Role::Student) {
            role @ (Role::Student | Role::Tutor) => role,
            _ => return Err(DomainError::validation("Invalid role")),
        };
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::validation("Email already registered"));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user = User::new(name.to_owned(), email, password_hash, role);
        self.users.insert(user.clone()).await?;
        tracing::info!(user_id = %user.id, role = ?role, "account registered");

        let token = self.tokens.issue(user.id, Utc::now())?;
        Ok(AuthSession {
            token,
            user: user.profile(),
        })
    }

    /// Verifies credentials. Deactivated accounts are rejected even with a
    /// correct password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("Invalid credentials".into()))?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(DomainError::Unauthenticated("Invalid credentials".into()));
        }
        if !user.is_active {
            return Err(DomainError::forbidden("Account is deactivated"));
        }

        let token = self.tokens.issue(user.id, Utc::now())?;
        Ok(AuthSession {
            token,
            user: user.profile(),
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        let user = self.require_user(user_id).await?;
        Ok(user.profile())
    }

    pub async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<UserProfile> {
        let mut user = self.require_user(user_id).await?;
        if let Some(name) = patch.name {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(DomainError::validation("Name cannot be empty"));
            }
            user.name = name;
        }
        if let Some(bio) = patch.bio {
            user.bio = Some(bio);
        }
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        Ok(user.profile())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<()> {
        let mut user = self.require_user(user_id).await?;
        if !self.hasher.verify(current, &user.password_hash) {
            return Err(DomainError::validation("Current password is incorrect"));
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        user.password_hash = self.hasher.hash(new_password)?;
        user.updated_at = Utc::now();
        self.users.update(&user).await
    }

    pub async fn update_settings(
        &self,
        user_id: Uuid,
        settings: NotificationSettings,
    ) -> Result<UserProfile> {
        let mut user = self.require_user(user_id).await?;
        user.settings = settings;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        Ok(user.profile())
    }

    /// Stores the uploaded image and points the profile at it.
    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        data: Vec<u8>,
        file_name: &str,
        content_type: &mime::Mime,
    ) -> Result<UserProfile> {
        if data.is_empty() {
            return Err(DomainError::validation("Please provide an image file"));
        }
        let stored = self.files.store(data, file_name, content_type).await?;
        let mut user = self.require_user(user_id).await?;
        user.avatar_url = Some(stored.url);
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        Ok(user.profile())
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }
}
