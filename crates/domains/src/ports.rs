//! # Ports
//!
//! Contracts between the domain and the adapter crates. Repository traits are
//! the document-store surface (lookup by id, compound-key lookup, filtered
//! listing, single-document mutation); the remaining traits wrap external
//! collaborators (blob store, mail transport, AI completion API, realtime
//! push, token/credential handling).
//!
//! Where a check-then-act sequence must not race (submission upsert, rating
//! upsert, enrollment append), the whole read-modify-write is a single port
//! method and the adapter performs it atomically per document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Assignment, ChatRoom, Conversation, Course, CourseLevel, Enrollment, Message, Notification,
    Participant, Post, Rating, Role, Submission, SubmissionDraft, TranscriptEntry, User,
};

// ---------------------------------------------------------------------------
// Document store
// ---------------------------------------------------------------------------

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Validation` when the email is already registered.
    async fn insert(&self, user: User) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Missing ids are skipped, not an error.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>>;
    async fn update(&self, user: &User) -> Result<()>;
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>>;
    async fn count(&self, role: Option<Role>) -> Result<u64>;
    /// Set-add semantics: enrolling twice leaves one reference.
    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> Result<()>;
}

/// Catalog query; `page` is 1-based.
#[derive(Debug, Clone)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub tutor_id: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub published_only: bool,
    pub page: u32,
    pub limit: u32,
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self {
            category: None,
            level: None,
            tutor_id: None,
            search: None,
            min_price: None,
            max_price: None,
            published_only: true,
            page: 1,
            limit: 12,
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CourseRepo: Send + Sync {
    async fn insert(&self, course: Course) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Course>>;
    async fn update(&self, course: &Course) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    /// Returns the requested page plus the total match count.
    async fn list(&self, filter: &CourseFilter) -> Result<(Vec<Course>, u64)>;
    async fn count(&self) -> Result<u64>;
    /// Sum of enrolled students across all courses.
    async fn enrollment_count(&self) -> Result<u64>;
    /// Atomic membership append: fails with `AlreadyEnrolled` / `CourseFull`
    /// under the same document lock that performs the append.
    async fn enroll_student(&self, course_id: Uuid, enrollment: Enrollment) -> Result<Course>;
    /// Atomic per-student rating upsert; returns the recomputed mean.
    async fn upsert_rating(&self, course_id: Uuid, rating: Rating) -> Result<f32>;
    async fn set_group_chat(&self, course_id: Uuid, room_id: Uuid) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AssignmentRepo: Send + Sync {
    async fn insert(&self, assignment: Assignment) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Assignment>>;
    /// Published assignments only, newest first.
    async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Assignment>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SubmissionRepo: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Submission>>;
    async fn find_by_pair(&self, assignment_id: Uuid, student_id: Uuid)
        -> Result<Option<Submission>>;
    /// Atomic read-modify-write keyed by (assignment, student): creates the
    /// document at attempt 1, or patches it and increments the attempt
    /// counter, always resetting status to submitted.
    async fn upsert(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        draft: SubmissionDraft,
    ) -> Result<Submission>;
    async fn update(&self, submission: &Submission) -> Result<()>;
    /// Newest first.
    async fn list_for_assignment(&self, assignment_id: Uuid) -> Result<Vec<Submission>>;
    /// Newest first, across all courses.
    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<Submission>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ChatRoomRepo: Send + Sync {
    async fn insert(&self, room: ChatRoom) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<ChatRoom>>;
    async fn rooms_for_user(&self, user_id: Uuid) -> Result<Vec<ChatRoom>>;
    /// Looks up the direct room for the unordered pair, creating it when
    /// absent.
    async fn find_or_create_direct(&self, a: Uuid, b: Uuid) -> Result<ChatRoom>;
    /// Set-add semantics keyed by user id.
    async fn add_participant(&self, room_id: Uuid, participant: Participant) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn insert(&self, message: Message) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Message>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    /// Chronological (persistence) order, capped at `limit` most recent.
    async fn list_for_room(&self, room_id: Uuid, limit: usize) -> Result<Vec<Message>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ConversationRepo: Send + Sync {
    async fn insert(&self, conversation: Conversation) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Conversation>>;
    /// Most recently updated first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>>;
    /// Appends one transcript entry and bumps `updated_at`.
    async fn append(&self, conversation_id: Uuid, entry: TranscriptEntry) -> Result<Conversation>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<()>;
    /// Single batch insert; partial failure is not retried per recipient.
    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<()>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>>;
    async fn unread_count(&self, user_id: Uuid) -> Result<u64>;
    /// `user_id` scopes the update so users cannot touch foreign records.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()>;
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn insert(&self, post: Post) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Post>>;
    async fn update(&self, post: &Post) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    /// Newest first; returns the page plus the total post count.
    async fn list(&self, page: u32, limit: u32) -> Result<(Vec<Post>, u64)>;
}

// ---------------------------------------------------------------------------
// External collaborators
// ---------------------------------------------------------------------------

/// Handle returned by the blob store: opaque id plus a public URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub url: String,
}

/// Opaque blob storage for uploads (submission attachments, avatars).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(
        &self,
        data: Vec<u8>,
        file_name: &str,
        content_type: &mime::Mime,
    ) -> Result<StoredFile>;
}

/// Outbound email. Callers treat every send as best-effort.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// One chat-completion call to the upstream AI service.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    /// Passed through verbatim for reasoning-capable models; omitted when
    /// `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_details: Option<serde_json::Value>,
}

/// The external completion API. Returns the raw assistant text; the mediator
/// owns all parsing and fallback behavior.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Best-effort push of a freshly persisted notification to the recipient's
/// live connections. Implemented by the realtime gateway; a no-op stand-in is
/// fine anywhere the gateway isn't running.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait RealtimePush: Send + Sync {
    fn push_notification(&self, notification: &Notification);
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub exp: i64,
}

/// Issues and verifies the bearer tokens shared by the HTTP API and the
/// realtime gateway.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenAuthority: Send + Sync {
    fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String>;
    /// Returns the subject user id of a valid, unexpired token.
    fn verify(&self, token: &str) -> Result<Uuid>;
}

/// Password hashing/verification behind a port so services never see the
/// algorithm.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}
