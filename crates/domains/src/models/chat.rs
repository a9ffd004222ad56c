use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// Two-party private conversation, created on demand
    Direct,
    /// Group chat scoped to a course's enrolled population
    Course,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(user_id: Uuid, role: ParticipantRole) -> Self {
        Self {
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// A realtime messaging channel. Course rooms are created together with their
/// course (the tutor joins as room admin); direct rooms appear the first time
/// either party opens the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: Uuid,
    pub name: String,
    pub room_type: RoomType,
    /// Set when `room_type == Course`
    pub course_id: Option<Uuid>,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn course_group(name: String, course_id: Uuid, tutor_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            room_type: RoomType::Course,
            course_id: Some(course_id),
            participants: vec![Participant::new(tutor_id, ParticipantRole::Admin)],
            created_at: Utc::now(),
        }
    }

    pub fn direct(a: Uuid, b: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::from("Direct Message"),
            room_type: RoomType::Direct,
            course_id: None,
            participants: vec![
                Participant::new(a, ParticipantRole::Member),
                Participant::new(b, ParticipantRole::Member),
            ],
            created_at: Utc::now(),
        }
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn participant_role(&self, user_id: Uuid) -> Option<ParticipantRole> {
        self.participants
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.role)
    }
}

/// A persisted chat message. Order within a room is persistence order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(room_id: Uuid, sender_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            sender_id,
            content,
            sent_at: Utc::now(),
        }
    }
}
