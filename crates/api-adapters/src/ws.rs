//! # Realtime gateway
//!
//! One WebSocket per client at `/ws?token=...`. Clients join rooms and send
//! messages; the gateway fans each delivery out to every open connection in
//! the room and pushes freshly stored notifications to their recipients.
//! Authentication happens before the upgrade, with the same tokens as HTTP.

use std::collections::HashSet;

use axum::extract::ws::{Message as Frame, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use domains::models::{Message, Notification, User};
use domains::ports::RealtimePush;
use domains::DomainError;

use crate::error::{status_and_message, ApiError};
use crate::state::AppState;

/// What a connected client may ask of the gateway.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum ClientEvent {
    Join { room_id: Uuid },
    Leave { room_id: Uuid },
    Send { room_id: Uuid, content: String },
    Delete { message_id: Uuid },
}

struct ConnectionHandle {
    user_id: Uuid,
    tx: mpsc::UnboundedSender<Frame>,
}

/// Connection registry. Maps live sockets to users and joined rooms; all
/// outbound traffic for a socket funnels through its channel so a slow
/// client never blocks a broadcast.
#[derive(Default)]
pub struct Gateway {
    connections: DashMap<Uuid, ConnectionHandle>,
    by_user: DashMap<Uuid, Vec<Uuid>>,
    rooms: DashMap<Uuid, HashSet<Uuid>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, connection_id: Uuid, user_id: Uuid, tx: mpsc::UnboundedSender<Frame>) {
        self.connections
            .insert(connection_id, ConnectionHandle { user_id, tx });
        self.by_user.entry(user_id).or_default().push(connection_id);
    }

    fn unregister(&self, connection_id: Uuid) {
        let Some((_, handle)) = self.connections.remove(&connection_id) else {
            return;
        };
        let now_empty = match self.by_user.get_mut(&handle.user_id) {
            Some(mut connections) => {
                connections.retain(|id| *id != connection_id);
                connections.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_user
                .remove_if(&handle.user_id, |_, connections| connections.is_empty());
        }
        self.rooms.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
    }

    fn join_room(&self, room_id: Uuid, connection_id: Uuid) {
        self.rooms
            .entry(room_id)
            .or_default()
            .insert(connection_id);
    }

    fn leave_room(&self, room_id: Uuid, connection_id: Uuid) {
        let now_empty = match self.rooms.get_mut(&room_id) {
            Some(mut members) => {
                members.remove(&connection_id);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove_if(&room_id, |_, members| members.is_empty());
        }
    }

    fn send_raw(&self, connection_id: Uuid, frame: Frame) {
        if let Some(handle) = self.connections.get(&connection_id) {
            // A failed send means the connection is tearing down.
            let _ = handle.tx.send(frame);
        }
    }

    fn send_json(&self, connection_id: Uuid, payload: &Value) {
        self.send_raw(connection_id, Frame::Text(payload.to_string().into()));
    }

    fn broadcast_room(&self, room_id: Uuid, payload: &Value) {
        let members: Vec<Uuid> = match self.rooms.get(&room_id) {
            Some(members) => members.iter().copied().collect(),
            None => return,
        };
        for connection_id in members {
            self.send_json(connection_id, payload);
        }
    }

    fn push_to_user(&self, user_id: Uuid, payload: &Value) {
        let connections: Vec<Uuid> = match self.by_user.get(&user_id) {
            Some(connections) => connections.clone(),
            None => return,
        };
        for connection_id in connections {
            self.send_json(connection_id, payload);
        }
    }

    /// Fans a stored chat message out to the room.
    pub fn broadcast_message(&self, message: &Message) {
        self.broadcast_room(message.room_id, &json!({ "event": "message", "data": message }));
    }

    /// Tells the room a message is gone. Also called by the HTTP delete
    /// handler so moderation shows up on live clients.
    pub fn broadcast_deletion(&self, message: &Message) {
        self.broadcast_room(
            message.room_id,
            &json!({
                "event": "message-deleted",
                "room_id": message.room_id,
                "message_id": message.id,
            }),
        );
    }
}

impl RealtimePush for Gateway {
    fn push_notification(&self, notification: &Notification) {
        self.push_to_user(
            notification.user_id,
            &json!({ "event": "notification", "data": notification }),
        );
    }
}

#[derive(Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// `GET /ws?token=...`. Rejects with a regular HTTP 401 before upgrading;
/// a connection is only ever established for an authenticated user.
pub async fn upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let token = match query.token.filter(|token| !token.is_empty()) {
        Some(token) => token,
        None => {
            return ApiError(DomainError::Unauthenticated(
                "Not authorized to access this route".to_owned(),
            ))
            .into_response()
        }
    };
    let user = match crate::extract::authenticate(&state, &token).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };
    ws.on_upgrade(move |socket| drive_connection(socket, state, user))
}

async fn drive_connection(socket: WebSocket, state: AppState, user: User) {
    let connection_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

    state.gateway.register(connection_id, user.id, tx);
    state.metrics.connection_opened();
    tracing::debug!(%connection_id, user_id = %user.id, "gateway connection opened");

    // Single writer per socket; broadcasts and replies all go through it.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = stream.next().await {
        let frame = match received {
            Ok(frame) => frame,
            Err(error) => {
                tracing::debug!(%connection_id, %error, "gateway connection errored");
                break;
            }
        };
        match frame {
            Frame::Text(text) => {
                handle_client_frame(&state, &user, connection_id, text.as_str()).await;
            }
            Frame::Ping(payload) => {
                state.gateway.send_raw(connection_id, Frame::Pong(payload));
            }
            Frame::Pong(_) => {}
            Frame::Binary(_) => {
                send_error(&state, connection_id, "Binary frames are not supported");
            }
            Frame::Close(_) => break,
        }
    }

    state.gateway.unregister(connection_id);
    state.metrics.connection_closed();
    writer.abort();
    tracing::debug!(%connection_id, user_id = %user.id, "gateway connection closed");
}

async fn handle_client_frame(state: &AppState, user: &User, connection_id: Uuid, raw: &str) {
    let event = match serde_json::from_str::<ClientEvent>(raw) {
        Ok(event) => event,
        Err(_) => {
            send_error(state, connection_id, "Unrecognized event");
            return;
        }
    };
    if let Err(err) = dispatch(state, user, connection_id, event).await {
        send_error(state, connection_id, &status_and_message(&err).1);
    }
}

async fn dispatch(
    state: &AppState,
    user: &User,
    connection_id: Uuid,
    event: ClientEvent,
) -> domains::Result<()> {
    match event {
        ClientEvent::Join { room_id } => {
            let room = state.chat.can_join(user.id, room_id).await?;
            state.gateway.join_room(room_id, connection_id);
            state.gateway.send_json(
                connection_id,
                &json!({ "event": "joined", "room_id": room.id, "room_name": room.name }),
            );
        }
        ClientEvent::Leave { room_id } => {
            state.gateway.leave_room(room_id, connection_id);
        }
        ClientEvent::Send { room_id, content } => {
            let message = state.chat.post_message(user.id, room_id, &content).await?;
            state.gateway.broadcast_message(&message);
        }
        ClientEvent::Delete { message_id } => {
            let message = state.chat.delete_message(user, message_id).await?;
            state.gateway.broadcast_deletion(&message);
        }
    }
    Ok(())
}

fn send_error(state: &AppState, connection_id: Uuid, message: &str) {
    state
        .gateway
        .send_json(connection_id, &json!({ "event": "error", "message": message }));
}
