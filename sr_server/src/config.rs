//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use std::net::SocketAddr;

use sequence_recall::RoomConfig;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("invalid room configuration: {0}")]
    Room(String),
}

/// Complete server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address.
    pub bind: SocketAddr,
    /// Configuration applied to created rooms.
    pub room: RoomConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// CLI arguments take precedence over the environment; defaults apply
    /// when neither is set.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable fails to parse or the resulting room
    /// configuration is invalid.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        capacity_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw =
                    std::env::var("SERVER_BIND").unwrap_or_else(|_| "127.0.0.1:8008".to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "SERVER_BIND",
                    value: raw,
                })?
            }
        };

        let capacity = match capacity_override {
            Some(capacity) => capacity,
            None => parse_env("ROOM_CAPACITY", 2)?,
        };
        let countdown_secs = parse_env("COUNTDOWN_SECS", 3)?;

        let room = RoomConfig {
            capacity,
            countdown_secs,
            ..RoomConfig::default()
        };
        room.validate().map_err(ConfigError::Room)?;

        Ok(Self { bind, room })
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}
