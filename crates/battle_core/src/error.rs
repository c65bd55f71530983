//! Error types for the battle simulation.
//!
//! Nothing in the core can fail at runtime. Every variant here is a
//! rejected caller action or a rejected data file, and rejection always
//! leaves the simulation untouched.

use thiserror::Error;

use crate::roster::Team;
use crate::simulation::GamePhase;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all battle simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The operation is not allowed in the current phase.
    #[error("Operation requires phase {expected:?}, match is in {actual:?}")]
    WrongPhase {
        /// Phase the operation needs.
        expected: GamePhase,
        /// Phase the match is actually in.
        actual: GamePhase,
    },

    /// No archetype with this id exists in the catalog.
    #[error("Unknown unit archetype: {0}")]
    UnknownArchetype(String),

    /// The team cannot afford the archetype.
    #[error("Insufficient budget for {team:?}: need {required}, have {available}")]
    InsufficientBudget {
        /// Team attempting the placement.
        team: Team,
        /// Archetype cost.
        required: u32,
        /// Remaining budget.
        available: u32,
    },

    /// Placement on the opponent's half of the arena.
    #[error("{team:?} must place units on its own half of the arena")]
    WrongSide {
        /// Team attempting the placement.
        team: Team,
    },

    /// Placement outside the arena.
    #[error("Placement is outside the arena")]
    OutOfBounds,

    /// Battle cannot start until both teams field a living unit.
    #[error("Both teams need at least one unit (red: {red}, blue: {blue})")]
    TeamsNotReady {
        /// Living RED units.
        red: usize,
        /// Living BLUE units.
        blue: usize,
    },

    /// An archetype definition violates catalog rules.
    #[error("Invalid archetype '{id}': {reason}")]
    InvalidArchetype {
        /// Archetype identifier.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A match configuration violates its rules.
    #[error("Invalid match config: {0}")]
    InvalidConfig(String),

    /// Data file parsing error.
    #[error("Failed to parse data: {message}")]
    DataParseError {
        /// Error message.
        message: String,
    },
}

impl From<ron::error::SpannedError> for GameError {
    fn from(err: ron::error::SpannedError) -> Self {
        GameError::DataParseError {
            message: err.to_string(),
        }
    }
}
