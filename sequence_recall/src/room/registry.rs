//! Room registry for spawning and managing room actors.

use std::{collections::HashMap, sync::Arc};

use log::info;
use rand::Rng;
use tokio::sync::{RwLock, mpsc, oneshot};

use super::{
    actor::{HostHandle, PlayerHandle, RoomActor, RoomHandle},
    config::RoomConfig,
    messages::{Notification, RoomMessage, RoomResponse, RoomStateResponse},
};
use crate::game::{
    GameError,
    entities::{ConnectionId, ROOM_ID_MAX, ROOM_ID_MIN, RoomId},
};

/// Registry owning every live room.
///
/// Rooms are exclusively owned here; the messaging gateway only ever holds
/// the room code and connection ids.
pub struct RoomRegistry {
    /// Configuration applied to created rooms.
    config: RoomConfig,

    /// Active room handles.
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
}

impl RoomRegistry {
    /// Create a new registry.
    ///
    /// # Panics
    ///
    /// Panics if the room configuration is invalid.
    #[must_use]
    pub fn new(config: RoomConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid room configuration: {e}");
        }
        Self {
            config,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create and spawn a new room, returning its code.
    ///
    /// The code is drawn at random and regenerated until it misses every
    /// live room, so two concurrent creations can never share one.
    pub async fn create_room(&self) -> RoomId {
        let mut rooms = self.rooms.write().await;

        let mut rng = rand::rng();
        let room_id = loop {
            let candidate = rng.random_range(ROOM_ID_MIN..ROOM_ID_MAX);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let (actor, handle) = RoomActor::new(room_id, self.config.clone());
        rooms.insert(room_id, handle);
        drop(rooms);

        tokio::spawn(async move {
            actor.run().await;
        });

        info!("created and spawned room {room_id}");
        room_id
    }

    /// Get a room handle.
    pub async fn get_room(&self, room_id: RoomId) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).cloned()
    }

    /// Get the host-side command surface for a room.
    pub async fn host_handle(&self, room_id: RoomId) -> Result<HostHandle, GameError> {
        let handle = self
            .get_room(room_id)
            .await
            .ok_or(GameError::RoomNotFound)?;
        Ok(HostHandle::new(handle))
    }

    /// Join a room as a player.
    ///
    /// Fails with `RoomNotFound` for unknown or expired codes. A full or
    /// already-running room fails with `CapacityExceeded`, which callers
    /// report to the joining client exactly like an unknown room.
    pub async fn join_room(
        &self,
        room_id: RoomId,
        display_name: impl Into<String>,
        connection_id: ConnectionId,
    ) -> Result<PlayerHandle, GameError> {
        let handle = self
            .get_room(room_id)
            .await
            .ok_or(GameError::RoomNotFound)?;

        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Join {
                display_name: display_name.into(),
                connection_id,
                response: tx,
            })
            .await?;

        match rx.await.map_err(|_| GameError::RoomNotFound)? {
            RoomResponse::Joined { player_id } => Ok(PlayerHandle::new(handle, player_id)),
            RoomResponse::Error(e) => Err(e),
            _ => Err(GameError::RoomNotFound),
        }
    }

    /// Subscribe a connection to a room's notifications.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        sender: mpsc::Sender<Notification>,
    ) -> Result<(), GameError> {
        let handle = self
            .get_room(room_id)
            .await
            .ok_or(GameError::RoomNotFound)?;
        handle
            .send(RoomMessage::Subscribe {
                connection_id,
                sender,
            })
            .await
    }

    /// Unsubscribe a connection, removing the room once the last one
    /// leaves.
    pub async fn disconnect(&self, room_id: RoomId, connection_id: ConnectionId) {
        let Some(handle) = self.get_room(room_id).await else {
            return;
        };

        let (tx, rx) = oneshot::channel();
        if handle
            .send(RoomMessage::Unsubscribe {
                connection_id,
                response: tx,
            })
            .await
            .is_err()
        {
            // Actor already gone; drop the stale handle.
            self.remove_room(room_id).await;
            return;
        }

        if let Ok(0) = rx.await {
            self.remove_room(room_id).await;
        }
    }

    /// Get a room's state snapshot.
    pub async fn room_state(&self, room_id: RoomId) -> Result<RoomStateResponse, GameError> {
        let handle = self
            .get_room(room_id)
            .await
            .ok_or(GameError::RoomNotFound)?;
        handle.state().await
    }

    /// Remove a room, cancelling its timers. Idempotent; any further
    /// command referencing the code fails with `RoomNotFound`.
    pub async fn remove_room(&self, room_id: RoomId) {
        let handle = {
            let mut rooms = self.rooms.write().await;
            rooms.remove(&room_id)
        };

        if let Some(handle) = handle {
            let (tx, _rx) = oneshot::channel();
            let _ = handle.send(RoomMessage::Close { response: tx }).await;
            info!("removed room {room_id}");
        }
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}
