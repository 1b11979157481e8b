//! Game error types.

use idlecraft_economy::EconomyError;
use thiserror::Error;

/// Errors surfaced by the game layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Declined by the economy core.
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// The upgrade needs an age the player hasn't reached.
    #[error("upgrade {upgrade} requires the {required} age (current: {current})")]
    AgeLocked {
        /// Upgrade key.
        upgrade: String,
        /// Required age.
        required: String,
        /// Age the player is in.
        current: String,
    },

    /// Age key not present in the age track.
    #[error("age not found: {0}")]
    UnknownAge(String),

    /// Invalid game configuration or age catalog.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read {path}: {reason}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error message.
        reason: String,
    },
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
