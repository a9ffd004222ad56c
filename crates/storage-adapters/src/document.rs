//! # Document store
//!
//! In-memory document store backing every repository port, with JSON snapshot
//! load/save for persistence across restarts. Collections are `DashMap`s keyed
//! by document id; compound lookups (submission by assignment+student, direct
//! room by participant pair, user by email) go through index maps whose entry
//! locks make the check-then-act upserts atomic per key.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::models::{
    Assignment, ChatRoom, Conversation, Course, Enrollment, Message, Notification, Participant,
    Post, Rating, Role, RoomType, Submission, SubmissionDraft, SubmissionStatus, TranscriptEntry,
    User,
};
use domains::ports::{
    AssignmentRepo, ChatRoomRepo, ConversationRepo, CourseFilter, CourseRepo, MessageRepo,
    NotificationRepo, PostRepo, SubmissionRepo, UserRepo,
};
use domains::{DomainError, Result};

/// On-disk snapshot shape. New collections default to empty so older
/// snapshots keep loading.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    courses: Vec<Course>,
    #[serde(default)]
    assignments: Vec<Assignment>,
    #[serde(default)]
    submissions: Vec<Submission>,
    #[serde(default)]
    rooms: Vec<ChatRoom>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    conversations: Vec<Conversation>,
    #[serde(default)]
    notifications: Vec<Notification>,
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    users: DashMap<Uuid, User>,
    courses: DashMap<Uuid, Course>,
    assignments: DashMap<Uuid, Assignment>,
    submissions: DashMap<Uuid, Submission>,
    rooms: DashMap<Uuid, ChatRoom>,
    messages: DashMap<Uuid, Message>,
    conversations: DashMap<Uuid, Conversation>,
    notifications: DashMap<Uuid, Notification>,
    posts: DashMap<Uuid, Post>,
    /// email -> user id; entry lock enforces unique registration
    email_index: DashMap<String, Uuid>,
    /// (assignment, student) -> submission id
    submission_index: DashMap<(Uuid, Uuid), Uuid>,
    /// ordered participant pair -> direct room id
    direct_index: DashMap<(Uuid, Uuid), Uuid>,
}

fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot from `path`; a missing file yields an empty store.
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no snapshot found, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&raw)?;
        let store = Self::new();
        for user in snapshot.users {
            store.email_index.insert(user.email.clone(), user.id);
            store.users.insert(user.id, user);
        }
        for course in snapshot.courses {
            store.courses.insert(course.id, course);
        }
        for assignment in snapshot.assignments {
            store.assignments.insert(assignment.id, assignment);
        }
        for submission in snapshot.submissions {
            store
                .submission_index
                .insert((submission.assignment_id, submission.student_id), submission.id);
            store.submissions.insert(submission.id, submission);
        }
        for room in snapshot.rooms {
            if room.room_type == RoomType::Direct {
                if let [a, b] = room.participants.as_slice() {
                    store
                        .direct_index
                        .insert(ordered_pair(a.user_id, b.user_id), room.id);
                }
            }
            store.rooms.insert(room.id, room);
        }
        for message in snapshot.messages {
            store.messages.insert(message.id, message);
        }
        for conversation in snapshot.conversations {
            store.conversations.insert(conversation.id, conversation);
        }
        for notification in snapshot.notifications {
            store.notifications.insert(notification.id, notification);
        }
        for post in snapshot.posts {
            store.posts.insert(post.id, post);
        }
        tracing::info!(
            path = %path.display(),
            users = store.users.len(),
            courses = store.courses.len(),
            "snapshot loaded"
        );
        Ok(store)
    }

    /// Writes the whole store as one JSON document.
    pub async fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let snapshot = Snapshot {
            users: self.users.iter().map(|r| r.value().clone()).collect(),
            courses: self.courses.iter().map(|r| r.value().clone()).collect(),
            assignments: self.assignments.iter().map(|r| r.value().clone()).collect(),
            submissions: self.submissions.iter().map(|r| r.value().clone()).collect(),
            rooms: self.rooms.iter().map(|r| r.value().clone()).collect(),
            messages: self.messages.iter().map(|r| r.value().clone()).collect(),
            conversations: self.conversations.iter().map(|r| r.value().clone()).collect(),
            notifications: self.notifications.iter().map(|r| r.value().clone()).collect(),
            posts: self.posts.iter().map(|r| r.value().clone()).collect(),
        };
        let raw = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(path, raw).await?;
        tracing::info!(path = %path.display(), "snapshot written");
        Ok(())
    }
}

#[async_trait]
impl UserRepo for MemoryDocumentStore {
    async fn insert(&self, user: User) -> Result<()> {
        match self.email_index.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DomainError::validation("Email already registered")),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                Ok(())
            }
        }
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.email_index.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|r| r.value().clone()))
            .collect())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut slot = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| DomainError::not_found("User", user.id))?;
        if slot.email != user.email {
            self.email_index.remove(&slot.email);
            self.email_index.insert(user.email.clone(), user.id);
        }
        *slot = user.clone();
        Ok(())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|r| role.is_none_or(|want| r.role == want))
            .map(|r| r.value().clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn count(&self, role: Option<Role>) -> Result<u64> {
        Ok(self
            .users
            .iter()
            .filter(|r| role.is_none_or(|want| r.role == want))
            .count() as u64)
    }

    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DomainError::not_found("User", user_id))?;
        if !user.enrolled_courses.contains(&course_id) {
            user.enrolled_courses.push(course_id);
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl CourseRepo for MemoryDocumentStore {
    async fn insert(&self, course: Course) -> Result<()> {
        self.courses.insert(course.id, course);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Course>> {
        Ok(self.courses.get(&id).map(|r| r.value().clone()))
    }

    async fn update(&self, course: &Course) -> Result<()> {
        let mut slot = self
            .courses
            .get_mut(&course.id)
            .ok_or_else(|| DomainError::not_found("Course", course.id))?;
        *slot = course.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.courses.remove(&id);
        Ok(())
    }

    async fn list(&self, filter: &CourseFilter) -> Result<(Vec<Course>, u64)> {
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matches: Vec<Course> = self
            .courses
            .iter()
            .filter(|c| !filter.published_only || c.is_published)
            .filter(|c| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|want| c.category.as_deref() == Some(want.as_str()))
            })
            .filter(|c| filter.level.is_none_or(|want| c.level == Some(want)))
            .filter(|c| filter.tutor_id.is_none_or(|want| c.tutor_id == want))
            .filter(|c| filter.min_price.is_none_or(|min| c.price >= min))
            .filter(|c| filter.max_price.is_none_or(|max| c.price <= max))
            .filter(|c| {
                needle.as_ref().is_none_or(|n| {
                    c.title.to_lowercase().contains(n)
                        || c.description.to_lowercase().contains(n)
                        || c.tags.iter().any(|t| t.to_lowercase().contains(n))
                })
            })
            .map(|c| c.value().clone())
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matches.len() as u64;
        let start = ((filter.page.max(1) - 1) * filter.limit) as usize;
        let page = matches
            .into_iter()
            .skip(start)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.courses.len() as u64)
    }

    async fn enrollment_count(&self) -> Result<u64> {
        Ok(self
            .courses
            .iter()
            .map(|c| c.enrolled_students.len() as u64)
            .sum())
    }

    async fn enroll_student(&self, course_id: Uuid, enrollment: Enrollment) -> Result<Course> {
        // get_mut holds the document lock across both checks and the append.
        let mut course = self
            .courses
            .get_mut(&course_id)
            .ok_or_else(|| DomainError::not_found("Course", course_id))?;
        if course
            .enrolled_students
            .iter()
            .any(|e| e.student_id == enrollment.student_id)
        {
            return Err(DomainError::AlreadyEnrolled);
        }
        if course.enrolled_students.len() as u32 >= course.max_students {
            return Err(DomainError::CourseFull);
        }
        course.enrolled_students.push(enrollment);
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn upsert_rating(&self, course_id: Uuid, rating: Rating) -> Result<f32> {
        let mut course = self
            .courses
            .get_mut(&course_id)
            .ok_or_else(|| DomainError::not_found("Course", course_id))?;
        match course
            .ratings
            .iter_mut()
            .find(|r| r.student_id == rating.student_id)
        {
            Some(existing) => *existing = rating,
            None => course.ratings.push(rating),
        }
        let sum: u32 = course.ratings.iter().map(|r| u32::from(r.rating)).sum();
        course.average_rating = sum as f32 / course.ratings.len() as f32;
        course.updated_at = Utc::now();
        Ok(course.average_rating)
    }

    async fn set_group_chat(&self, course_id: Uuid, room_id: Uuid) -> Result<()> {
        let mut course = self
            .courses
            .get_mut(&course_id)
            .ok_or_else(|| DomainError::not_found("Course", course_id))?;
        course.group_chat_id = Some(room_id);
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepo for MemoryDocumentStore {
    async fn insert(&self, assignment: Assignment) -> Result<()> {
        self.assignments.insert(assignment.id, assignment);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Assignment>> {
        Ok(self.assignments.get(&id).map(|r| r.value().clone()))
    }

    async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Assignment>> {
        let mut assignments: Vec<Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.course_id == course_id && a.is_published)
            .map(|a| a.value().clone())
            .collect();
        assignments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assignments)
    }
}

#[async_trait]
impl SubmissionRepo for MemoryDocumentStore {
    async fn find(&self, id: Uuid) -> Result<Option<Submission>> {
        Ok(self.submissions.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_pair(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Submission>> {
        let Some(id) = self
            .submission_index
            .get(&(assignment_id, student_id))
            .map(|r| *r.value())
        else {
            return Ok(None);
        };
        Ok(self.submissions.get(&id).map(|r| r.value().clone()))
    }

    async fn upsert(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        draft: SubmissionDraft,
    ) -> Result<Submission> {
        // The index entry lock serializes concurrent submits for the same
        // (assignment, student) pair: exactly one record, later calls patch it.
        match self.submission_index.entry((assignment_id, student_id)) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let mut submission = self
                    .submissions
                    .get_mut(&id)
                    .ok_or_else(|| DomainError::internal("submission index out of sync"))?;
                if let Some(files) = draft.files {
                    submission.files = files;
                }
                if let Some(text) = draft.text {
                    submission.text = Some(text);
                }
                submission.is_late = draft.is_late;
                submission.submitted_at = draft.submitted_at;
                submission.attempt_number += 1;
                submission.status = SubmissionStatus::Submitted;
                Ok(submission.clone())
            }
            Entry::Vacant(slot) => {
                let submission = Submission {
                    id: Uuid::new_v4(),
                    assignment_id,
                    student_id,
                    files: draft.files.unwrap_or_default(),
                    text: draft.text,
                    submitted_at: draft.submitted_at,
                    is_late: draft.is_late,
                    attempt_number: 1,
                    status: SubmissionStatus::Submitted,
                    score: None,
                    feedback: None,
                    graded_by: None,
                    graded_at: None,
                };
                self.submissions.insert(submission.id, submission.clone());
                slot.insert(submission.id);
                Ok(submission)
            }
        }
    }

    async fn update(&self, submission: &Submission) -> Result<()> {
        let mut slot = self
            .submissions
            .get_mut(&submission.id)
            .ok_or_else(|| DomainError::not_found("Submission", submission.id))?;
        *slot = submission.clone();
        Ok(())
    }

    async fn list_for_assignment(&self, assignment_id: Uuid) -> Result<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|s| s.assignment_id == assignment_id)
            .map(|s| s.value().clone())
            .collect();
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|s| s.student_id == student_id)
            .map(|s| s.value().clone())
            .collect();
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }
}

#[async_trait]
impl ChatRoomRepo for MemoryDocumentStore {
    async fn insert(&self, room: ChatRoom) -> Result<()> {
        if room.room_type == RoomType::Direct {
            if let [a, b] = room.participants.as_slice() {
                self.direct_index
                    .insert(ordered_pair(a.user_id, b.user_id), room.id);
            }
        }
        self.rooms.insert(room.id, room);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ChatRoom>> {
        Ok(self.rooms.get(&id).map(|r| r.value().clone()))
    }

    async fn rooms_for_user(&self, user_id: Uuid) -> Result<Vec<ChatRoom>> {
        let mut rooms: Vec<ChatRoom> = self
            .rooms
            .iter()
            .filter(|r| r.is_participant(user_id))
            .map(|r| r.value().clone())
            .collect();
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }

    async fn find_or_create_direct(&self, a: Uuid, b: Uuid) -> Result<ChatRoom> {
        match self.direct_index.entry(ordered_pair(a, b)) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                self.rooms
                    .get(&id)
                    .map(|r| r.value().clone())
                    .ok_or_else(|| DomainError::internal("direct room index out of sync"))
            }
            Entry::Vacant(slot) => {
                let room = ChatRoom::direct(a, b);
                slot.insert(room.id);
                self.rooms.insert(room.id, room.clone());
                Ok(room)
            }
        }
    }

    async fn add_participant(&self, room_id: Uuid, participant: Participant) -> Result<()> {
        let mut room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| DomainError::not_found("ChatRoom", room_id))?;
        if !room.is_participant(participant.user_id) {
            room.participants.push(participant);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageRepo for MemoryDocumentStore {
    async fn insert(&self, message: Message) -> Result<()> {
        self.messages.insert(message.id, message);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Message>> {
        Ok(self.messages.get(&id).map(|r| r.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.messages.remove(&id);
        Ok(())
    }

    async fn list_for_room(&self, room_id: Uuid, limit: usize) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .map(|m| m.value().clone())
            .collect();
        messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));
        let start = messages.len().saturating_sub(limit);
        Ok(messages.split_off(start))
    }
}

#[async_trait]
impl ConversationRepo for MemoryDocumentStore {
    async fn insert(&self, conversation: Conversation) -> Result<()> {
        self.conversations.insert(conversation.id, conversation);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.conversations.get(&id).map(|r| r.value().clone()))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone())
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn append(&self, conversation_id: Uuid, entry: TranscriptEntry) -> Result<Conversation> {
        let mut conversation = self
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| DomainError::not_found("Conversation", conversation_id))?;
        conversation.updated_at = entry.timestamp;
        conversation.messages.push(entry);
        Ok(conversation.clone())
    }
}

#[async_trait]
impl NotificationRepo for MemoryDocumentStore {
    async fn insert(&self, notification: Notification) -> Result<()> {
        self.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<()> {
        for notification in notifications {
            self.notifications.insert(notification.id, notification);
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .map(|n| n.value().clone())
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let mut notification = self
            .notifications
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| DomainError::not_found("Notification", id))?;
        notification.is_read = true;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut updated = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.user_id == user_id && !entry.is_read {
                entry.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl PostRepo for MemoryDocumentStore {
    async fn insert(&self, post: Post) -> Result<()> {
        self.posts.insert(post.id, post);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|r| r.value().clone()))
    }

    async fn update(&self, post: &Post) -> Result<()> {
        let mut slot = self
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| DomainError::not_found("Post", post.id))?;
        *slot = post.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.posts.remove(&id);
        Ok(())
    }

    async fn list(&self, page: u32, limit: u32) -> Result<(Vec<Post>, u64)> {
        let mut posts: Vec<Post> = self.posts.iter().map(|p| p.value().clone()).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = posts.len() as u64;
        let start = ((page.max(1) - 1) * limit) as usize;
        let page = posts
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }
}
