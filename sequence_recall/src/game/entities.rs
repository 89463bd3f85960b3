//! Core domain types for the sequence-memory game.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single move code drawn from the room's move alphabet
/// (`1..=alphabet_size`).
pub type Move = u8;

/// Number of distinct moves available per round unless configured otherwise.
pub const DEFAULT_ALPHABET_SIZE: u8 = 4;

/// Numeric room code handed out to clients. Codes are five digits so a
/// player can type one from the host's screen.
pub type RoomId = u32;

/// Lower bound (inclusive) of the room code space.
pub const ROOM_ID_MIN: RoomId = 10_000;

/// Upper bound (exclusive) of the room code space.
pub const ROOM_ID_MAX: RoomId = 100_000;

/// Unique identifier for a player within a room.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport-level connection identifier. The core never inspects the
/// connection itself; this is only used to address point-to-point messages.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One member of a room.
///
/// Entries are added on join and never removed mid-game; elimination is
/// tracked via the `active` flag so the final screen can still show every
/// name.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Participant {
    pub display_name: String,
    pub connection_id: ConnectionId,
    /// Still eligible to continue. Cleared on a wrong answer, restored only
    /// on session restart.
    pub active: bool,
    /// Whether this participant has answered the current round.
    pub answered_this_round: bool,
}

impl Participant {
    #[must_use]
    pub fn new(display_name: impl Into<String>, connection_id: ConnectionId) -> Self {
        Self {
            display_name: display_name.into(),
            connection_id,
            active: true,
            answered_this_round: false,
        }
    }
}
