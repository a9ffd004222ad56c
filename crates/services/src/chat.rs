//! # Chat
//!
//! Room membership, message history and message lifecycle. The same service
//! backs the REST endpoints and the realtime gateway; the gateway only adds
//! connection bookkeeping and fan-out on top.

use std::sync::Arc;

use uuid::Uuid;

use domains::models::{ChatRoom, Message, User};
use domains::policy;
use domains::ports::{ChatRoomRepo, MessageRepo, UserRepo};
use domains::{DomainError, Result};

/// Most recent messages returned by a history fetch.
pub const HISTORY_LIMIT: usize = 100;

pub struct ChatService {
    rooms: Arc<dyn ChatRoomRepo>,
    messages: Arc<dyn MessageRepo>,
    users: Arc<dyn UserRepo>,
}

impl ChatService {
    pub fn new(
        rooms: Arc<dyn ChatRoomRepo>,
        messages: Arc<dyn MessageRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            rooms,
            messages,
            users,
        }
    }

    pub async fn rooms_for_user(&self, user_id: Uuid) -> Result<Vec<ChatRoom>> {
        self.rooms.rooms_for_user(user_id).await
    }

    pub async fn room(&self, room_id: Uuid) -> Result<ChatRoom> {
        self.rooms
            .find(room_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ChatRoom", room_id))
    }

    /// Chronological history, participants only.
    pub async fn history(&self, user_id: Uuid, room_id: Uuid) -> Result<Vec<Message>> {
        let room = self.room(room_id).await?;
        policy::require_participant(&room, user_id)?;
        self.messages.list_for_room(room_id, HISTORY_LIMIT).await
    }

    /// Opens (or returns the existing) direct room with a peer.
    pub async fn open_direct(&self, user_id: Uuid, peer_id: Uuid) -> Result<ChatRoom> {
        if user_id == peer_id {
            return Err(DomainError::validation(
                "Cannot open a direct room with yourself",
            ));
        }
        if self.users.find(peer_id).await?.is_none() {
            return Err(DomainError::not_found("User", peer_id));
        }
        self.rooms.find_or_create_direct(user_id, peer_id).await
    }

    /// Ensures membership, persists, returns the stored message. Fan-out to
    /// live connections is the gateway's job and happens after this returns,
    /// so per-room order is persistence order.
    pub async fn post_message(
        &self,
        user_id: Uuid,
        room_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("Message cannot be empty"));
        }
        let room = self.room(room_id).await?;
        policy::require_participant(&room, user_id)?;
        let message = Message::new(room_id, user_id, content.to_owned());
        self.messages.insert(message.clone()).await?;
        Ok(message)
    }

    /// Deletes a message (sender or room admin) and returns it so the caller
    /// can broadcast the deletion.
    pub async fn delete_message(&self, user: &User, message_id: Uuid) -> Result<Message> {
        let message = self
            .messages
            .find(message_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Message", message_id))?;
        let room = self.room(message.room_id).await?;
        if !policy::can_delete_message(&room, user.id, message.sender_id) {
            return Err(DomainError::forbidden(
                "Not authorized to delete this message",
            ));
        }
        self.messages.delete(message_id).await?;
        Ok(message)
    }

    /// Membership check used by the gateway before joining a connection to a
    /// room's fan-out list.
    pub async fn can_join(&self, user_id: Uuid, room_id: Uuid) -> Result<ChatRoom> {
        let room = self.room(room_id).await?;
        policy::require_participant(&room, user_id)?;
        Ok(room)
    }
}
