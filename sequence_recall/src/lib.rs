//! # Sequence Recall
//!
//! A real-time, room-based "repeat the growing sequence" memory game engine.
//!
//! One host display and several player clients share a room. Each round the
//! room's move sequence grows, the host presents it, players reproduce it,
//! and wrong answers eliminate players until a single winner remains.
//!
//! ## Architecture
//!
//! The session lifecycle is a finite state machine with seven phases:
//!
//! - **WaitingForPlayers**: Waiting for the room to fill
//! - **Countdown**: All players present, countdown running
//! - **Preparation**: Appending new moves to the sequence
//! - **Presenting**: Host is animating the full sequence
//! - **Collecting**: Players are submitting answers
//! - **Scoring**: Deciding next round versus game over
//! - **Finished**: A winner (or nobody) remains
//!
//! Each room runs in its own Tokio task with an mpsc message inbox; the
//! [`room::RoomRegistry`] spawns and looks up rooms by numeric room code.
//!
//! ## Core Modules
//!
//! - [`game`]: Sequence generation, the session state machine, and answer
//!   verification
//! - [`room`]: Room registry, per-room actor, and message protocol
//!
//! ## Example
//!
//! ```
//! use sequence_recall::game::{Session, session::SessionSettings};
//!
//! // Create a new session waiting for players
//! let session = Session::new(12345, SessionSettings::default());
//! ```

/// Core game logic: sequence generation, session FSM, answer verification.
pub mod game;
pub use game::{
    GameError, Phase, Session, SessionEvent,
    session::SessionSettings,
    entities::{ConnectionId, Move, Participant, PlayerId, RoomId},
    sequence::SequenceGenerator,
    verifier::{Verdict, verify},
};

/// Room lifecycle: registry, actor, and messaging.
pub mod room;
pub use room::{
    HostHandle, Notification, PlayerHandle, RoomConfig, RoomHandle, RoomMessage, RoomRegistry,
    RoomResponse, RoomStateResponse,
};
