//! WebSocket handler bridging clients to room actors.
//!
//! One WebSocket connection maps to one room subscription. The connecting
//! client picks its role once, at connect time:
//!
//! - `role=host` - the display that created the room; it paces the game
//!   (room-full, countdown-finished, presentation-finished, restart)
//! - `role=player` - joins the room under `name` and submits answers
//!
//! The server forwards room [`Notification`]s to the socket as JSON in the
//! order the session produced them, and parses tagged JSON commands from
//! the client. Stale or out-of-phase commands are acknowledged and
//! dropped; unknown rooms are reported with the same message whether the
//! code is wrong or the room is simply full.

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use sequence_recall::{
    ConnectionId, GameError, HostHandle, Move, Notification, PlayerHandle, RoomResponse,
    game::entities::RoomId,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::AppState;

const ROOM_UNAVAILABLE: &str = "This room does not exist.";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Player,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    role: Role,
    name: Option<String>,
}

/// Client messages received via WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Host: every seat is taken, start the countdown (used after a
    /// restart).
    RoomFull,
    /// Host: the countdown animation finished.
    CountdownFinished,
    /// Host: done presenting the sequence for `round`.
    PresentationFinished { round: u32 },
    /// Player: submitted answer for `round`.
    Answer { round: u32, sequence: Vec<Move> },
    /// Restart a finished game.
    Restart,
}

/// Response messages sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerResponse {
    Success { message: String },
    Error { message: String },
}

enum RoleHandle {
    Host(HostHandle),
    Player(PlayerHandle),
}

/// Upgrade an HTTP connection to a WebSocket bound to one room.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<RoomId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, query, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, room_id: RoomId, query: WsQuery, state: AppState) {
    let connection_id = ConnectionId::new();
    let (mut sender, mut receiver) = socket.split();

    info!(
        "websocket connected: room={room_id}, role={:?}, connection={connection_id}",
        query.role
    );

    // Subscribe to room notifications before joining, so this connection
    // sees its own join notice.
    let (notification_tx, mut notification_rx) = mpsc::channel::<Notification>(32);
    if state
        .registry
        .subscribe(room_id, connection_id, notification_tx)
        .await
        .is_err()
    {
        let _ = send_response(
            &mut sender,
            &ServerResponse::Error {
                message: ROOM_UNAVAILABLE.to_string(),
            },
        )
        .await;
        return;
    }

    let role_handle = match query.role {
        Role::Host => match state.registry.host_handle(room_id).await {
            Ok(handle) => RoleHandle::Host(handle),
            Err(_) => {
                state.registry.disconnect(room_id, connection_id).await;
                return;
            }
        },
        Role::Player => {
            let name = query.name.unwrap_or_else(|| "anonymous".to_string());
            match state.registry.join_room(room_id, name, connection_id).await {
                Ok(handle) => RoleHandle::Player(handle),
                Err(e) => {
                    // A full room is reported exactly like an unknown one.
                    debug!("join rejected for room {room_id}: {e}");
                    let _ = send_response(
                        &mut sender,
                        &ServerResponse::Error {
                            message: ROOM_UNAVAILABLE.to_string(),
                        },
                    )
                    .await;
                    state.registry.disconnect(room_id, connection_id).await;
                    return;
                }
            }
        }
    };

    // Channel for command responses produced by the receive loop.
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    // Send task: forwards room notifications and command responses.
    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                notification = notification_rx.recv() => {
                    let Some(notification) = notification else { break };
                    let json = match serde_json::to_string(&notification) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("failed to serialize notification: {e}");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                response = response_rx.recv() => {
                    let Some(response) = response else { break };
                    if sender.send(Message::Text(response.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Receive loop: parse and route client commands.
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_message) => handle_client_message(client_message, &role_handle).await,
                    Err(e) => {
                        warn!("failed to parse client message: {e}");
                        ServerResponse::Error {
                            message: "Invalid message format".to_string(),
                        }
                    }
                };
                if let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    send_task.abort();
    state.registry.disconnect(room_id, connection_id).await;
    info!("websocket disconnected: room={room_id}, connection={connection_id}");
}

async fn handle_client_message(message: ClientMessage, role: &RoleHandle) -> ServerResponse {
    let result = match (role, message) {
        (RoleHandle::Host(host), ClientMessage::RoomFull) => host.room_full().await,
        (RoleHandle::Host(host), ClientMessage::CountdownFinished) => {
            host.countdown_finished().await
        }
        (RoleHandle::Host(host), ClientMessage::PresentationFinished { round }) => {
            host.presentation_finished(round).await
        }
        (RoleHandle::Host(host), ClientMessage::Restart) => host.restart().await,
        (RoleHandle::Player(player), ClientMessage::Answer { round, sequence }) => {
            player.answer(round, sequence).await
        }
        (RoleHandle::Player(player), ClientMessage::Restart) => player.restart().await,
        _ => {
            return ServerResponse::Error {
                message: "Command not available for this role".to_string(),
            };
        }
    };

    match result {
        Ok(RoomResponse::Success | RoomResponse::Joined { .. }) => ServerResponse::Success {
            message: "ok".to_string(),
        },
        Ok(RoomResponse::Verdict { .. }) => ServerResponse::Success {
            message: "answer received".to_string(),
        },
        // Stale or out-of-phase events are dropped by design; the client
        // still gets an acknowledgement.
        Ok(RoomResponse::Dropped) => ServerResponse::Success {
            message: "ignored".to_string(),
        },
        Ok(RoomResponse::Error(e)) | Err(e) => match e {
            GameError::RoomNotFound | GameError::CapacityExceeded => ServerResponse::Error {
                message: ROOM_UNAVAILABLE.to_string(),
            },
            other => ServerResponse::Error {
                message: other.to_string(),
            },
        },
    }
}

async fn send_response(
    sender: &mut (impl SinkExt<Message> + Unpin),
    response: &ServerResponse,
) -> Result<(), ()> {
    let json = serde_json::to_string(response).map_err(|_| ())?;
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}
