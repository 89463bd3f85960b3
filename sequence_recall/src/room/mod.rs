//! Room module providing multi-room support with an async actor model.
//!
//! This module implements:
//! - `RoomActor`: Async actor owning a single room's session
//! - `RoomRegistry`: Creates, looks up, and removes room actors
//! - Message-based communication with tokio channels
//! - Room configuration and lifecycle management
//!
//! ## Architecture
//!
//! Each room runs in a separate Tokio task with an mpsc message inbox, so
//! every inbound command for a room is handled to completion before the
//! next one; cross-room commands proceed in parallel. The `RoomRegistry`
//! spawns and manages `RoomActor` instances, providing room code
//! generation, join coordination, and resource cleanup. The messaging
//! gateway subscribes connections to a room and receives [`Notification`]s
//! in the order the session produced them.

pub mod actor;
pub mod config;
pub mod messages;
pub mod registry;

pub use actor::{HostHandle, PlayerHandle, RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use messages::{Notification, ParticipantInfo, RoomMessage, RoomResponse, RoomStateResponse};
pub use registry::RoomRegistry;
