//! Room actor implementation with async message handling.

use std::collections::HashMap;

use log::{debug, info, warn};
use tokio::{
    sync::{mpsc, oneshot},
    time::{Duration, Instant, interval},
};

use super::{
    config::RoomConfig,
    messages::{Notification, ParticipantInfo, RoomMessage, RoomResponse, RoomStateResponse},
};
use crate::game::{
    GameError, Phase, Session, SessionEvent,
    entities::{ConnectionId, Move, PlayerId, RoomId},
};

/// Room actor handle for sending messages.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    /// Create a new room handle.
    #[must_use]
    pub fn new(sender: mpsc::Sender<RoomMessage>, room_id: RoomId) -> Self {
        Self { sender, room_id }
    }

    /// Get the room code.
    #[must_use]
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Send a message to the room. A closed room reports `RoomNotFound`,
    /// matching what the caller would see for an expired room code.
    pub async fn send(&self, message: RoomMessage) -> Result<(), GameError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::RoomNotFound)
    }

    /// Get a state snapshot.
    pub async fn state(&self) -> Result<RoomStateResponse, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::GetState { response: tx }).await?;
        rx.await.map_err(|_| GameError::RoomNotFound)
    }
}

async fn round_trip(
    handle: &RoomHandle,
    make: impl FnOnce(oneshot::Sender<RoomResponse>) -> RoomMessage,
) -> Result<RoomResponse, GameError> {
    let (tx, rx) = oneshot::channel();
    handle.send(make(tx)).await?;
    rx.await.map_err(|_| GameError::RoomNotFound)
}

/// Host-side command surface, selected once at connect time.
///
/// The host display paces the game: it reports when the room should start,
/// when its countdown animation finished, and when it is done presenting
/// the sequence.
#[derive(Clone, Debug)]
pub struct HostHandle {
    handle: RoomHandle,
}

impl HostHandle {
    #[must_use]
    pub fn new(handle: RoomHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn room_id(&self) -> RoomId {
        self.handle.room_id()
    }

    pub async fn room_full(&self) -> Result<RoomResponse, GameError> {
        round_trip(&self.handle, |response| RoomMessage::RoomFull { response }).await
    }

    pub async fn countdown_finished(&self) -> Result<RoomResponse, GameError> {
        round_trip(&self.handle, |response| RoomMessage::CountdownFinished {
            response,
        })
        .await
    }

    pub async fn presentation_finished(&self, round: u32) -> Result<RoomResponse, GameError> {
        round_trip(&self.handle, |response| RoomMessage::PresentationFinished {
            round,
            response,
        })
        .await
    }

    pub async fn restart(&self) -> Result<RoomResponse, GameError> {
        round_trip(&self.handle, |response| RoomMessage::Restart { response }).await
    }
}

/// Player-side command surface, selected once at join time.
#[derive(Clone, Debug)]
pub struct PlayerHandle {
    handle: RoomHandle,
    player_id: PlayerId,
}

impl PlayerHandle {
    #[must_use]
    pub fn new(handle: RoomHandle, player_id: PlayerId) -> Self {
        Self { handle, player_id }
    }

    #[must_use]
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    #[must_use]
    pub fn room_id(&self) -> RoomId {
        self.handle.room_id()
    }

    pub async fn answer(&self, round: u32, sequence: Vec<Move>) -> Result<RoomResponse, GameError> {
        let player_id = self.player_id;
        round_trip(&self.handle, move |response| RoomMessage::PlayerAnswer {
            player_id,
            round,
            sequence,
            response,
        })
        .await
    }

    pub async fn restart(&self) -> Result<RoomResponse, GameError> {
        round_trip(&self.handle, |response| RoomMessage::Restart { response }).await
    }
}

/// Room actor managing a single game room.
pub struct RoomActor {
    /// Room code.
    id: RoomId,

    /// Room configuration.
    config: RoomConfig,

    /// Session state machine.
    session: Session,

    /// Message inbox.
    inbox: mpsc::Receiver<RoomMessage>,

    /// Subscribers for notifications, keyed by connection.
    subscribers: HashMap<ConnectionId, mpsc::Sender<Notification>>,

    /// Deadline for the running countdown, checked on tick. Cleared when
    /// the countdown resolves or the host short-circuits it.
    countdown_deadline: Option<Instant>,

    /// Whether any connection ever subscribed; once true, the room closes
    /// itself when the last one leaves.
    had_subscribers: bool,

    /// Is the room closed.
    is_closed: bool,
}

impl RoomActor {
    /// Create a new room actor and its handle.
    #[must_use]
    pub fn new(id: RoomId, config: RoomConfig) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let session = Session::new(id, config.session_settings());

        let actor = Self {
            id,
            config,
            session,
            inbox,
            subscribers: HashMap::new(),
            countdown_deadline: None,
            had_subscribers: false,
            is_closed: false,
        };
        let handle = RoomHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the room actor event loop.
    ///
    /// Commands for this room are serialized through the inbox; the tick
    /// drives the countdown timer re-entrantly. Dropping out of this loop
    /// cancels every pending timer for the room.
    pub async fn run(mut self) {
        info!("room {} starting", self.id);

        let mut tick_interval = interval(Duration::from_millis(self.config.tick_millis));

        loop {
            tokio::select! {
                Some(message) = self.inbox.recv() => {
                    self.handle_message(message);
                    if self.is_closed {
                        break;
                    }
                }

                _ = tick_interval.tick() => {
                    self.tick();
                }

                else => break,
            }
        }

        info!("room {} closed", self.id);
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                display_name,
                connection_id,
                response,
            } => {
                let result = self
                    .session
                    .join(display_name, connection_id)
                    .map(|player_id| RoomResponse::Joined { player_id });
                let _ = response.send(self.map_response(result));
            }

            RoomMessage::RoomFull { response } => {
                let result = self.session.room_full().map(|()| RoomResponse::Success);
                let _ = response.send(self.map_response(result));
            }

            RoomMessage::CountdownFinished { response } => {
                let result = self
                    .session
                    .countdown_finished()
                    .map(|()| RoomResponse::Success);
                self.countdown_deadline = None;
                let _ = response.send(self.map_response(result));
            }

            RoomMessage::PresentationFinished { round, response } => {
                let result = self
                    .session
                    .presentation_finished(round)
                    .map(|()| RoomResponse::Success);
                let _ = response.send(self.map_response(result));
            }

            RoomMessage::PlayerAnswer {
                player_id,
                round,
                sequence,
                response,
            } => {
                let result = self
                    .session
                    .player_answer(player_id, round, &sequence)
                    .map(|verdict| RoomResponse::Verdict {
                        correct: verdict.correct,
                    });
                let _ = response.send(self.map_response(result));
            }

            RoomMessage::Restart { response } => {
                let result = self.session.restart().map(|()| RoomResponse::Success);
                let _ = response.send(self.map_response(result));
            }

            RoomMessage::GetState { response } => {
                let _ = response.send(self.state_snapshot());
            }

            RoomMessage::Subscribe {
                connection_id,
                sender,
            } => {
                let greeting = Notification::Connected { room_id: self.id };
                if sender.try_send(greeting).is_ok() {
                    self.subscribers.insert(connection_id, sender);
                    self.had_subscribers = true;
                    debug!("connection {connection_id} subscribed to room {}", self.id);
                }
            }

            RoomMessage::Unsubscribe {
                connection_id,
                response,
            } => {
                self.subscribers.remove(&connection_id);
                debug!(
                    "connection {connection_id} unsubscribed from room {}",
                    self.id
                );
                if self.subscribers.is_empty() && self.had_subscribers {
                    info!("room {}: last connection left, closing", self.id);
                    self.is_closed = true;
                }
                let _ = response.send(self.subscribers.len());
            }

            RoomMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(RoomResponse::Success);
            }

            RoomMessage::Tick => {
                self.tick();
            }
        }

        self.flush_events();
    }

    /// Map a session result onto the wire response, dropping the expected
    /// noise (stale rounds, events with no transition) instead of
    /// surfacing it.
    fn map_response(&self, result: Result<RoomResponse, GameError>) -> RoomResponse {
        match result {
            Ok(response) => response,
            Err(
                e @ (GameError::StaleRound { .. }
                | GameError::InvalidPhaseTransition
                | GameError::Eliminated
                | GameError::AlreadyAnswered),
            ) => {
                debug!("room {}: dropped event: {e}", self.id);
                RoomResponse::Dropped
            }
            Err(e) => RoomResponse::Error(e),
        }
    }

    /// Advance the countdown timer. Runs as an ordinary re-entrant event
    /// so a destroyed room can never fire into a deleted session.
    fn tick(&mut self) {
        let Some(deadline) = self.countdown_deadline else {
            return;
        };
        if self.session.phase() != Phase::Countdown {
            self.countdown_deadline = None;
            return;
        }
        if Instant::now() >= deadline {
            self.countdown_deadline = None;
            if self.session.countdown_finished().is_ok() {
                debug!("room {}: countdown expired", self.id);
            }
            self.flush_events();
        }
    }

    /// Forward session events to subscribers in the order produced.
    fn flush_events(&mut self) {
        let events = self.session.drain_events();
        for event in events {
            match event {
                SessionEvent::ParticipantJoined {
                    player_id,
                    display_name,
                } => {
                    self.broadcast(Notification::ParticipantJoined {
                        room_id: self.id,
                        player_id,
                        display_name,
                    });
                }
                SessionEvent::BeginCountdown => {
                    self.countdown_deadline =
                        Some(Instant::now() + Duration::from_secs(self.config.countdown_secs));
                    self.broadcast(Notification::BeginCountdown {
                        room_id: self.id,
                        seconds: self.config.countdown_secs,
                    });
                }
                SessionEvent::SequenceReady { round, sequence } => {
                    self.broadcast(Notification::SequenceReady {
                        room_id: self.id,
                        round,
                        sequence,
                    });
                }
                SessionEvent::CollectAnswers { round } => {
                    self.broadcast(Notification::CollectAnswers {
                        room_id: self.id,
                        round,
                    });
                }
                SessionEvent::AnswerVerdict { player_id, correct } => {
                    self.send_to_player(player_id, Notification::AnswerVerdict {
                        player_id,
                        correct,
                    });
                }
                SessionEvent::RoundAdvanced { round } => {
                    self.broadcast(Notification::RoundAdvanced {
                        room_id: self.id,
                        round,
                    });
                }
                SessionEvent::GameOver { winner } => {
                    self.broadcast(Notification::GameOver {
                        room_id: self.id,
                        winner,
                    });
                }
            }
        }
    }

    /// Broadcast a notification to all subscribers, pruning the dead ones.
    fn broadcast(&mut self, notification: Notification) {
        let room_id = self.id;
        self.subscribers.retain(|connection_id, sender| {
            match sender.try_send(notification.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("room {room_id}: subscriber {connection_id} full, dropping notification");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("room {room_id}: subscriber {connection_id} disconnected, removing");
                    false
                }
            }
        });
    }

    /// Deliver a point-to-point notification to one participant's
    /// connection.
    fn send_to_player(&mut self, player_id: PlayerId, notification: Notification) {
        let Some(connection_id) = self.session.connection_of(player_id) else {
            debug!("room {}: no connection for player {player_id}", self.id);
            return;
        };
        if let Some(sender) = self.subscribers.get(&connection_id)
            && sender.try_send(notification).is_err()
        {
            debug!(
                "room {}: failed point-to-point delivery to {connection_id}",
                self.id
            );
        }
    }

    fn state_snapshot(&self) -> RoomStateResponse {
        let participants = self
            .session
            .participants()
            .iter()
            .map(|(player_id, p)| ParticipantInfo {
                player_id: *player_id,
                display_name: p.display_name.clone(),
                active: p.active,
            })
            .collect();

        RoomStateResponse {
            room_id: self.id,
            phase: self.session.phase(),
            round: self.session.round(),
            sequence_len: self.session.sequence().len(),
            capacity: self.session.capacity(),
            participant_count: self.session.participant_count(),
            active_participants: self.session.active_participants(),
            pending_responses: self.session.pending_responses(),
            participants,
        }
    }
}
