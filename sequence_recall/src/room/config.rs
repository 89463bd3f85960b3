//! Room configuration models.

use serde::{Deserialize, Serialize};

use crate::game::{entities::DEFAULT_ALPHABET_SIZE, session::SessionSettings};

/// Room configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomConfig {
    /// Number of players that fills the room (default: 2, a duel).
    pub capacity: usize,

    /// Size of the move alphabet (default: 4).
    pub alphabet_size: u8,

    /// Sequence length for round 0.
    pub opening_moves: usize,

    /// Moves appended each later round.
    pub moves_per_round: usize,

    /// Countdown length before the first round.
    pub countdown_secs: u64,

    /// Actor tick interval, which bounds countdown-timer resolution.
    pub tick_millis: u64,

    /// Deterministic generator seed, for tests.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            alphabet_size: DEFAULT_ALPHABET_SIZE,
            opening_moves: 1,
            moves_per_round: 1,
            countdown_secs: 3,
            tick_millis: 250,
            seed: None,
        }
    }
}

impl RoomConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity < 2 {
            return Err("Capacity must be at least 2".to_string());
        }
        if self.alphabet_size < 2 {
            return Err("Alphabet must have at least 2 moves".to_string());
        }
        if self.opening_moves == 0 || self.moves_per_round == 0 {
            return Err("Sequence increment must be positive".to_string());
        }
        if self.tick_millis == 0 {
            return Err("Tick interval must be positive".to_string());
        }
        Ok(())
    }

    /// Session settings derived from this room configuration.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            capacity: self.capacity,
            alphabet_size: self.alphabet_size,
            opening_moves: self.opening_moves,
            moves_per_round: self.moves_per_round,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RoomConfig::default().validate().is_ok());
    }

    #[test]
    fn solo_rooms_are_rejected() {
        let config = RoomConfig {
            capacity: 1,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_increment_is_rejected() {
        let config = RoomConfig {
            moves_per_round: 0,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
