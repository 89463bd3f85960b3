//! Room actor message types.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    GameError, Phase,
    entities::{ConnectionId, Move, PlayerId, RoomId},
};

/// Messages that can be sent to a `RoomActor`.
#[derive(Debug)]
pub enum RoomMessage {
    /// Player join request.
    Join {
        display_name: String,
        connection_id: ConnectionId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Host reports the room is full (used after a restart, where no
    /// further join will fire the automatic countdown).
    RoomFull {
        response: oneshot::Sender<RoomResponse>,
    },

    /// Host reports the countdown finished ahead of the server timer.
    CountdownFinished {
        response: oneshot::Sender<RoomResponse>,
    },

    /// Host finished presenting the sequence for `round`.
    PresentationFinished {
        round: u32,
        response: oneshot::Sender<RoomResponse>,
    },

    /// A player's submitted answer for `round`.
    PlayerAnswer {
        player_id: PlayerId,
        round: u32,
        sequence: Vec<Move>,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Restart a finished game with the same participants.
    Restart {
        response: oneshot::Sender<RoomResponse>,
    },

    /// Get a state snapshot for diagnostics or UI.
    GetState {
        response: oneshot::Sender<RoomStateResponse>,
    },

    /// Subscribe a connection to room notifications.
    Subscribe {
        connection_id: ConnectionId,
        sender: mpsc::Sender<Notification>,
    },

    /// Unsubscribe a connection; replies with the remaining subscriber
    /// count so the registry can reap empty rooms.
    Unsubscribe {
        connection_id: ConnectionId,
        response: oneshot::Sender<usize>,
    },

    /// Close the room.
    Close {
        response: oneshot::Sender<RoomResponse>,
    },

    /// Internal: advance timers (normally driven by the actor's interval).
    Tick,
}

/// Response from room operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoomResponse {
    /// Operation succeeded.
    Success,

    /// Join succeeded.
    Joined { player_id: PlayerId },

    /// Answer was checked.
    Verdict { correct: bool },

    /// Event had no effect (stale round or no transition from the current
    /// phase) and was dropped, by design.
    Dropped,

    /// Operation failed.
    Error(GameError),
}

impl RoomResponse {
    /// Check if the response is a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, RoomResponse::Error(_))
    }

    /// Get the error if the response is one.
    #[must_use]
    pub fn error(&self) -> Option<&GameError> {
        match self {
            RoomResponse::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Participant entry in a state snapshot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ParticipantInfo {
    pub player_id: PlayerId,
    pub display_name: String,
    pub active: bool,
}

/// Room state snapshot.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoomStateResponse {
    pub room_id: RoomId,
    pub phase: Phase,
    pub round: u32,
    pub sequence_len: usize,
    pub capacity: usize,
    pub participant_count: usize,
    pub active_participants: usize,
    pub pending_responses: usize,
    pub participants: Vec<ParticipantInfo>,
}

/// Notifications delivered to room subscribers.
///
/// All variants are broadcast room-wide except `AnswerVerdict`, which is
/// delivered only to the answering participant's connection.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Greeting sent to a connection right after it subscribes.
    Connected { room_id: RoomId },
    ParticipantJoined {
        room_id: RoomId,
        player_id: PlayerId,
        display_name: String,
    },
    BeginCountdown { room_id: RoomId, seconds: u64 },
    SequenceReady {
        room_id: RoomId,
        round: u32,
        sequence: Vec<Move>,
    },
    CollectAnswers { room_id: RoomId, round: u32 },
    AnswerVerdict { player_id: PlayerId, correct: bool },
    RoundAdvanced { room_id: RoomId, round: u32 },
    GameOver {
        room_id: RoomId,
        winner: Option<PlayerId>,
    },
}
