use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a transcript entry. Serialized as `"user"` / `"ai"` to stay
/// wire-compatible with existing clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    Human,
    #[serde(rename = "ai")]
    Assistant,
}

/// One turn of an AI conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn now(sender: Sender, content: String) -> Self {
        Self {
            sender,
            content,
            timestamp: Utc::now(),
        }
    }
}

pub const DEFAULT_CONVERSATION_NAME: &str = "Untitled Chat";

/// An AI-assistant conversation owned by one user. Append-only: prior turns
/// are never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub messages: Vec<TranscriptEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(user_id: Uuid, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONVERSATION_NAME.to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
