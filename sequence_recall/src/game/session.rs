//! Session state machine for a single game room.
//!
//! A [`Session`] owns everything mutable about one room: the current phase,
//! the canonical move sequence, the round counter, and participant
//! accounting. Transitions are driven only by the methods here; rejected
//! events return a typed error and never touch `sequence` or `round`.

use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    fmt,
};
use thiserror::Error;

use super::{
    entities::{ConnectionId, DEFAULT_ALPHABET_SIZE, Move, Participant, PlayerId, RoomId},
    sequence::SequenceGenerator,
    verifier::{self, Verdict},
};

/// Errors that can occur when a command is rejected by the state machine.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("room does not exist")]
    RoomNotFound,
    #[error("room is full")]
    CapacityExceeded,
    #[error("event references round {submitted}, session is at round {current}")]
    StaleRound { submitted: u32, current: u32 },
    #[error("no transition for this event in the current phase")]
    InvalidPhaseTransition,
    #[error("unknown participant")]
    UnknownParticipant,
    #[error("participant has been eliminated")]
    Eliminated,
    #[error("participant already answered this round")]
    AlreadyAnswered,
    #[error("display name already taken")]
    NameTaken,
}

/// The session's position in its lifecycle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the room to fill.
    WaitingForPlayers,
    /// All players present, countdown running.
    Countdown,
    /// Appending new moves to the sequence. Transient.
    Preparation,
    /// Host is animating the full sequence.
    Presenting,
    /// Players are submitting answers.
    Collecting,
    /// Deciding next round versus game over. Transient.
    Scoring,
    /// Terminal until an explicit restart.
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WaitingForPlayers => "waiting_for_players",
            Self::Countdown => "countdown",
            Self::Preparation => "preparation",
            Self::Presenting => "presenting",
            Self::Collecting => "collecting",
            Self::Scoring => "scoring",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Events emitted as side effects of transitions.
///
/// Drained by the room actor and handed to the messaging gateway in the
/// order produced. `AnswerVerdict` is addressed to one participant; all
/// other events are room-wide.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum SessionEvent {
    ParticipantJoined {
        player_id: PlayerId,
        display_name: String,
    },
    BeginCountdown,
    SequenceReady {
        round: u32,
        sequence: Vec<Move>,
    },
    CollectAnswers {
        round: u32,
    },
    AnswerVerdict {
        player_id: PlayerId,
        correct: bool,
    },
    RoundAdvanced {
        round: u32,
    },
    GameOver {
        winner: Option<PlayerId>,
    },
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::ParticipantJoined { display_name, .. } => {
                format!("{display_name} joined the room")
            }
            Self::BeginCountdown => "room full, countdown started".to_string(),
            Self::SequenceReady { round, sequence } => {
                format!("round {round}: sequence of {} ready", sequence.len())
            }
            Self::CollectAnswers { round } => format!("round {round}: collecting answers"),
            Self::AnswerVerdict { player_id, correct } => {
                format!("{player_id} answered {}", if *correct { "correctly" } else { "incorrectly" })
            }
            Self::RoundAdvanced { round } => format!("advanced to round {round}"),
            Self::GameOver { winner: Some(winner) } => format!("game over, {winner} wins"),
            Self::GameOver { winner: None } => "game over, nobody wins".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Session configuration settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SessionSettings {
    /// Number of players that fills the room and starts the countdown.
    pub capacity: usize,
    /// Size of the move alphabet.
    pub alphabet_size: u8,
    /// Sequence length for round 0.
    pub opening_moves: usize,
    /// Moves appended on each later round.
    pub moves_per_round: usize,
    /// Deterministic generator seed, for tests.
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            capacity: 2,
            alphabet_size: DEFAULT_ALPHABET_SIZE,
            opening_moves: 1,
            moves_per_round: 1,
            seed: None,
        }
    }
}

/// One game room's state.
#[derive(Debug)]
pub struct Session {
    id: RoomId,
    phase: Phase,
    /// Canonical move sequence. Append-only within a game; reset only on
    /// restart.
    sequence: Vec<Move>,
    round: u32,
    /// Players still eligible to continue. Never exceeds the participant
    /// count; never incremented except at (re)start.
    active_participants: usize,
    /// Answers received in the current round's collection phase.
    pending_responses: usize,
    participants: HashMap<PlayerId, Participant>,
    generator: SequenceGenerator,
    settings: SessionSettings,
    events: VecDeque<SessionEvent>,
}

impl Session {
    #[must_use]
    pub fn new(id: RoomId, settings: SessionSettings) -> Self {
        let generator = match settings.seed {
            Some(seed) => SequenceGenerator::seeded(settings.alphabet_size, seed),
            None => SequenceGenerator::new(settings.alphabet_size),
        };
        Self {
            id,
            phase: Phase::WaitingForPlayers,
            sequence: Vec::new(),
            round: 0,
            active_participants: 0,
            pending_responses: 0,
            participants: HashMap::with_capacity(settings.capacity),
            generator,
            settings,
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn sequence(&self) -> &[Move] {
        &self.sequence
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.settings.capacity
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn active_participants(&self) -> usize {
        self.active_participants
    }

    #[must_use]
    pub fn pending_responses(&self) -> usize {
        self.pending_responses
    }

    #[must_use]
    pub fn participants(&self) -> &HashMap<PlayerId, Participant> {
        &self.participants
    }

    /// Connection to address a point-to-point message to.
    #[must_use]
    pub fn connection_of(&self, player_id: PlayerId) -> Option<ConnectionId> {
        self.participants.get(&player_id).map(|p| p.connection_id)
    }

    /// Drain events produced by transitions since the last call.
    pub fn drain_events(&mut self) -> VecDeque<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add a participant while the room is waiting for players.
    ///
    /// Fills that reach capacity start the countdown automatically. Joins
    /// on a full or already-running room fail with `CapacityExceeded`.
    pub fn join(
        &mut self,
        display_name: impl Into<String>,
        connection_id: ConnectionId,
    ) -> Result<PlayerId, GameError> {
        if self.phase != Phase::WaitingForPlayers {
            return Err(GameError::CapacityExceeded);
        }
        if self.participants.len() >= self.settings.capacity {
            return Err(GameError::CapacityExceeded);
        }
        let display_name = display_name.into();
        if self
            .participants
            .values()
            .any(|p| p.display_name == display_name)
        {
            return Err(GameError::NameTaken);
        }

        let player_id = PlayerId::new();
        self.participants
            .insert(player_id, Participant::new(display_name.clone(), connection_id));
        self.active_participants += 1;
        self.events.push_back(SessionEvent::ParticipantJoined {
            player_id,
            display_name,
        });

        if self.participants.len() == self.settings.capacity {
            self.begin_countdown();
        }
        Ok(player_id)
    }

    /// Host-driven "room full" signal.
    ///
    /// Redundant when the filling join already started the countdown, but
    /// required after a restart, where the room is already at capacity and
    /// no further join will arrive.
    pub fn room_full(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::WaitingForPlayers
            || self.participants.len() < self.settings.capacity
        {
            return Err(GameError::InvalidPhaseTransition);
        }
        self.begin_countdown();
        Ok(())
    }

    fn begin_countdown(&mut self) {
        self.phase = Phase::Countdown;
        self.events.push_back(SessionEvent::BeginCountdown);
    }

    /// The countdown expired (timer) or the host reported it finished.
    ///
    /// Passes through `Preparation` and lands in `Presenting` with the
    /// sequence grown by the configured increment.
    pub fn countdown_finished(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Countdown {
            return Err(GameError::InvalidPhaseTransition);
        }
        self.start_round();
        Ok(())
    }

    /// Grow the sequence and enter `Presenting` for the current round.
    fn start_round(&mut self) {
        self.phase = Phase::Preparation;
        let count = if self.round == 0 {
            self.settings.opening_moves
        } else {
            self.settings.moves_per_round
        };
        let fresh = self.generator.next_moves(count);
        self.sequence.extend(fresh);
        self.pending_responses = 0;
        for participant in self.participants.values_mut() {
            participant.answered_this_round = false;
        }
        self.phase = Phase::Presenting;
        self.events.push_back(SessionEvent::SequenceReady {
            round: self.round,
            sequence: self.sequence.clone(),
        });
    }

    /// The host finished animating the sequence; open answer collection.
    pub fn presentation_finished(&mut self, round: u32) -> Result<(), GameError> {
        if self.phase != Phase::Presenting {
            return Err(GameError::InvalidPhaseTransition);
        }
        if round != self.round {
            return Err(GameError::StaleRound {
                submitted: round,
                current: self.round,
            });
        }
        self.phase = Phase::Collecting;
        self.events
            .push_back(SessionEvent::CollectAnswers { round: self.round });
        Ok(())
    }

    /// Verify one player's submitted sequence.
    ///
    /// Stale rounds are rejected before any state is touched and emit no
    /// verdict. A wrong answer eliminates the participant for the rest of
    /// the game but keeps their entry for the final display.
    pub fn player_answer(
        &mut self,
        player_id: PlayerId,
        round: u32,
        submitted: &[Move],
    ) -> Result<Verdict, GameError> {
        if self.phase != Phase::Collecting {
            return Err(GameError::InvalidPhaseTransition);
        }
        if round != self.round {
            return Err(GameError::StaleRound {
                submitted: round,
                current: self.round,
            });
        }
        let participant = self
            .participants
            .get(&player_id)
            .ok_or(GameError::UnknownParticipant)?;
        if !participant.active {
            return Err(GameError::Eliminated);
        }
        if participant.answered_this_round {
            return Err(GameError::AlreadyAnswered);
        }

        let verdict = verifier::verify(&self.sequence, submitted);
        let participant = self
            .participants
            .get_mut(&player_id)
            .ok_or(GameError::UnknownParticipant)?;
        participant.answered_this_round = true;
        self.pending_responses += 1;
        if !verdict.correct {
            participant.active = false;
            self.active_participants -= 1;
        }
        self.events.push_back(SessionEvent::AnswerVerdict {
            player_id,
            correct: verdict.correct,
        });

        if self.round_complete() {
            self.resolve_round();
        }
        Ok(verdict)
    }

    /// A round is complete once every still-active participant has
    /// answered it. Participants eliminated in earlier rounds never count
    /// toward the denominator; one eliminated this round has, by
    /// definition, already answered.
    fn round_complete(&self) -> bool {
        self.participants
            .values()
            .all(|p| !p.active || p.answered_this_round)
    }

    fn resolve_round(&mut self) {
        self.phase = Phase::Scoring;
        if self.active_participants >= 2 {
            self.round += 1;
            self.events
                .push_back(SessionEvent::RoundAdvanced { round: self.round });
            self.start_round();
        } else {
            self.phase = Phase::Finished;
            let winner = self
                .participants
                .iter()
                .find(|(_, p)| p.active)
                .map(|(id, _)| *id);
            self.events.push_back(SessionEvent::GameOver { winner });
            debug!("room {}: game over, winner {winner:?}", self.id);
        }
    }

    /// Restart a finished game with the same participants.
    ///
    /// Clears the sequence and round counter and reactivates everyone. The
    /// host signals `room_full` to start the next countdown.
    pub fn restart(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Finished {
            return Err(GameError::InvalidPhaseTransition);
        }
        self.sequence.clear();
        self.round = 0;
        self.pending_responses = 0;
        for participant in self.participants.values_mut() {
            participant.active = true;
            participant.answered_this_round = false;
        }
        self.active_participants = self.participants.len();
        self.phase = Phase::WaitingForPlayers;
        for (player_id, participant) in &self.participants {
            self.events.push_back(SessionEvent::ParticipantJoined {
                player_id: *player_id,
                display_name: participant.display_name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(capacity: usize, opening: usize, increment: usize) -> SessionSettings {
        SessionSettings {
            capacity,
            alphabet_size: 4,
            opening_moves: opening,
            moves_per_round: increment,
            seed: Some(7),
        }
    }

    fn filled_session(capacity: usize, opening: usize, increment: usize) -> (Session, Vec<PlayerId>) {
        let mut session = Session::new(11111, settings(capacity, opening, increment));
        let ids = (0..capacity)
            .map(|i| {
                session
                    .join(format!("player-{i}"), ConnectionId::new())
                    .unwrap()
            })
            .collect();
        (session, ids)
    }

    /// Drive a filled session into `Collecting` and return the canonical
    /// sequence.
    fn open_collection(session: &mut Session) -> Vec<Move> {
        session.countdown_finished().unwrap();
        let sequence = session.sequence().to_vec();
        session.presentation_finished(session.round()).unwrap();
        sequence
    }

    #[test]
    fn filling_join_starts_countdown() {
        let (session, _) = filled_session(2, 1, 1);
        assert_eq!(session.phase(), Phase::Countdown);
        assert_eq!(session.participant_count(), 2);
        assert_eq!(session.active_participants(), 2);
    }

    #[test]
    fn join_after_capacity_is_rejected() {
        let (mut session, _) = filled_session(2, 1, 1);
        let err = session.join("late", ConnectionId::new()).unwrap_err();
        assert_eq!(err, GameError::CapacityExceeded);
        assert_eq!(session.participant_count(), 2);
    }

    #[test]
    fn duplicate_display_name_is_rejected() {
        let mut session = Session::new(11111, settings(3, 1, 1));
        session.join("alice", ConnectionId::new()).unwrap();
        let err = session.join("alice", ConnectionId::new()).unwrap_err();
        assert_eq!(err, GameError::NameTaken);
    }

    #[test]
    fn opening_round_has_configured_length() {
        let (mut session, _) = filled_session(2, 3, 1);
        session.countdown_finished().unwrap();
        assert_eq!(session.phase(), Phase::Presenting);
        assert_eq!(session.sequence().len(), 3);
        assert_eq!(session.round(), 0);
    }

    #[test]
    fn countdown_finished_outside_countdown_is_rejected() {
        let mut session = Session::new(11111, settings(2, 1, 1));
        assert_eq!(
            session.countdown_finished().unwrap_err(),
            GameError::InvalidPhaseTransition
        );
    }

    #[test]
    fn presentation_finished_with_stale_round_is_rejected() {
        let (mut session, _) = filled_session(2, 1, 1);
        session.countdown_finished().unwrap();
        let err = session.presentation_finished(5).unwrap_err();
        assert_eq!(
            err,
            GameError::StaleRound {
                submitted: 5,
                current: 0
            }
        );
        assert_eq!(session.phase(), Phase::Presenting);
    }

    #[test]
    fn wrong_answer_eliminates_and_finishes_duel() {
        // Scenario: two players, one answers correctly, the other does not.
        let (mut session, ids) = filled_session(2, 1, 1);
        let sequence = open_collection(&mut session);

        let verdict = session.player_answer(ids[0], 0, &sequence).unwrap();
        assert!(verdict.correct);
        assert_eq!(session.phase(), Phase::Collecting);

        let mut wrong = sequence.clone();
        wrong[0] = wrong[0] % 4 + 1;
        let verdict = session.player_answer(ids[1], 0, &wrong).unwrap();
        assert!(!verdict.correct);

        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.active_participants(), 1);
        // Loser stays in the participant map for the final display.
        assert_eq!(session.participant_count(), 2);
        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::GameOver {
            winner: Some(ids[0])
        }));
    }

    #[test]
    fn all_wrong_finishes_with_no_winner() {
        let (mut session, ids) = filled_session(2, 1, 1);
        let sequence = open_collection(&mut session);
        let mut wrong = sequence.clone();
        wrong.push(1);

        session.player_answer(ids[0], 0, &wrong).unwrap();
        session.player_answer(ids[1], 0, &wrong).unwrap();

        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.active_participants(), 0);
        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::GameOver { winner: None }));
    }

    #[test]
    fn all_correct_appends_to_prior_sequence() {
        // Three players all answer correctly; the next round's sequence
        // must extend the prior one, not replace it.
        let (mut session, ids) = filled_session(3, 2, 1);
        let sequence = open_collection(&mut session);
        assert_eq!(sequence.len(), 2);

        for id in &ids {
            session.player_answer(*id, 0, &sequence).unwrap();
        }

        assert_eq!(session.round(), 1);
        assert_eq!(session.phase(), Phase::Presenting);
        assert_eq!(session.sequence().len(), 3);
        assert_eq!(&session.sequence()[..2], sequence.as_slice());
    }

    #[test]
    fn stale_answer_is_dropped_without_side_effects() {
        let (mut session, ids) = filled_session(2, 1, 1);
        let sequence = open_collection(&mut session);
        session.drain_events();

        let err = session.player_answer(ids[0], 5, &sequence).unwrap_err();
        assert_eq!(
            err,
            GameError::StaleRound {
                submitted: 5,
                current: 0
            }
        );
        assert_eq!(session.pending_responses(), 0);
        assert_eq!(session.active_participants(), 2);
        // No verdict was emitted for the dropped answer.
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn double_answer_is_rejected() {
        let (mut session, ids) = filled_session(3, 1, 1);
        let sequence = open_collection(&mut session);
        session.player_answer(ids[0], 0, &sequence).unwrap();
        let err = session.player_answer(ids[0], 0, &sequence).unwrap_err();
        assert_eq!(err, GameError::AlreadyAnswered);
        assert_eq!(session.pending_responses(), 1);
    }

    #[test]
    fn eliminated_player_is_excluded_from_later_rounds() {
        // Three players; one is eliminated in round 0. Round 1 completes
        // once the two survivors answer, without waiting for the third.
        let (mut session, ids) = filled_session(3, 1, 1);
        let sequence = open_collection(&mut session);
        let mut wrong = sequence.clone();
        wrong.push(2);

        session.player_answer(ids[0], 0, &sequence).unwrap();
        session.player_answer(ids[1], 0, &sequence).unwrap();
        session.player_answer(ids[2], 0, &wrong).unwrap();
        assert_eq!(session.round(), 1);

        let sequence = session.sequence().to_vec();
        session.presentation_finished(1).unwrap();
        session.player_answer(ids[0], 1, &sequence).unwrap();
        session.player_answer(ids[1], 1, &sequence).unwrap();

        // Round resolved with only the two survivors answering.
        assert_eq!(session.round(), 2);
        assert_eq!(session.phase(), Phase::Presenting);

        // The eliminated player answering anyway is dropped.
        session.presentation_finished(2).unwrap();
        let err = session
            .player_answer(ids[2], 2, session.sequence().to_vec().as_slice())
            .unwrap_err();
        assert_eq!(err, GameError::Eliminated);
    }

    #[test]
    fn answer_outside_collecting_is_rejected() {
        let (mut session, ids) = filled_session(2, 1, 1);
        session.countdown_finished().unwrap();
        // Still presenting.
        let err = session
            .player_answer(ids[0], 0, session.sequence().to_vec().as_slice())
            .unwrap_err();
        assert_eq!(err, GameError::InvalidPhaseTransition);
    }

    #[test]
    fn restart_resets_game_but_keeps_participants() {
        let (mut session, ids) = filled_session(2, 1, 1);
        let sequence = open_collection(&mut session);
        let mut wrong = sequence.clone();
        wrong.push(3);
        session.player_answer(ids[0], 0, &sequence).unwrap();
        session.player_answer(ids[1], 0, &wrong).unwrap();
        assert_eq!(session.phase(), Phase::Finished);

        session.restart().unwrap();
        assert_eq!(session.phase(), Phase::WaitingForPlayers);
        assert_eq!(session.round(), 0);
        assert!(session.sequence().is_empty());
        assert_eq!(session.participant_count(), 2);
        assert_eq!(session.active_participants(), 2);

        // The room is still at capacity, so the host restarts the countdown.
        session.room_full().unwrap();
        assert_eq!(session.phase(), Phase::Countdown);
    }

    #[test]
    fn restart_outside_finished_is_rejected() {
        let (mut session, _) = filled_session(2, 1, 1);
        assert_eq!(
            session.restart().unwrap_err(),
            GameError::InvalidPhaseTransition
        );
    }

    #[test]
    fn sequence_grows_by_increment_each_round() {
        let (mut session, ids) = filled_session(2, 2, 2);
        session.countdown_finished().unwrap();
        for n in 0..5u32 {
            assert_eq!(session.sequence().len(), 2 * (n as usize + 1));
            let sequence = session.sequence().to_vec();
            session.presentation_finished(n).unwrap();
            for id in &ids {
                session.player_answer(*id, n, &sequence).unwrap();
            }
        }
    }
}
