//! Error types for the skirmish engine.
//!
//! Two families live here:
//!
//! - [`Rejection`]: an expected, recoverable domain failure. Every command
//!   returns one of these instead of panicking when it is not legal right now
//!   (wrong phase, occupied cell, not enough energy...). The caller re-prompts
//!   or ignores it.
//! - [`GameError`]: a fatal failure. Corrupted snapshots, invalid configs and
//!   board/entity mismatches end up here; the engine cannot safely continue
//!   from them.

use thiserror::Error;

use crate::entities::{PlayerId, UnitId};
use crate::grid::Position;
use crate::turn::Phase;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Result type for engine commands and validations.
pub type CommandResult<T> = std::result::Result<T, Rejection>;

/// Top-level error type for fatal engine errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration failed to parse.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse {
        /// Path (or `<inline>`) of the config source.
        path: String,
        /// Parser message.
        message: String,
    },

    /// Configuration parsed but violates an engine requirement.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Snapshot could not be decoded.
    #[error("Failed to parse snapshot: {0}")]
    SnapshotParse(String),

    /// Snapshot decoded but its contents contradict each other.
    #[error("Corrupted snapshot: {0}")]
    SnapshotCorrupted(String),

    /// Stored board grid disagrees with the entity positions.
    #[error("Board mismatch at {position}: grid holds {found}, entities place {expected}")]
    BoardMismatch {
        /// Cell where the disagreement was found.
        position: Position,
        /// Occupant derived from entity records.
        expected: String,
        /// Occupant recorded in the stored grid.
        found: String,
    },

    /// Board write would break the single-occupancy invariant.
    #[error("Cell {0} is already occupied")]
    CellOccupied(Position),

    /// Coordinate outside the configured grid.
    #[error("Position {0} is out of bounds")]
    OutOfBounds(Position),

    /// Encoding or decoding failure.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Replay written by an incompatible engine version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Reason a command was refused.
///
/// Rejections never mutate state. Use [`Rejection::code`] for a stable,
/// machine-readable reason string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Commands other than `start_game` need a started game.
    #[error("game has not started")]
    GameNotStarted,

    /// `start_game` was issued twice.
    #[error("game has already started")]
    AlreadyStarted,

    /// The game has ended; only queries are accepted.
    #[error("game is over")]
    GameOver,

    /// Target coordinate is off the grid.
    #[error("position ({x}, {y}) is out of bounds")]
    OutOfBounds {
        /// Requested x.
        x: i32,
        /// Requested y.
        y: i32,
    },

    /// Target cell already holds an entity.
    #[error("cell {0} is occupied")]
    Occupied(Position),

    /// Unit does not have enough actions left for this command.
    #[error("unit needs {required} actions but has {available}")]
    InsufficientActions {
        /// Actions the command costs.
        required: u32,
        /// Actions the unit has left.
        available: u32,
    },

    /// Player has spent their whole per-turn action budget.
    #[error("player has no actions left this turn")]
    PlayerActionsExhausted,

    /// Command is not legal in the current phase.
    #[error("command requires the {required} phase, current phase is {current}")]
    WrongPhase {
        /// Phase the command needs.
        required: Phase,
        /// Phase the game is in.
        current: Phase,
    },

    /// Actor does not belong to the player whose turn it is.
    #[error("player {0} is not the current player")]
    NotCurrentPlayer(PlayerId),

    /// Not enough energy to pay for a build.
    #[error("build costs {required} energy, player has {available}")]
    InsufficientEnergy {
        /// Energy cost.
        required: u32,
        /// Energy available.
        available: u32,
    },

    /// Spawn cell is too far from the player's base.
    #[error("spawn cell {0} is out of range of the player's base")]
    SpawnTooFar(Position),

    /// Player has no standing base to build from.
    #[error("player {0} has no standing base")]
    NoBase(PlayerId),

    /// Target is not in the attacker's 8-neighbourhood.
    #[error("target {0} is not adjacent")]
    NotAdjacent(Position),

    /// Target belongs to the attacker's own side.
    #[error("target {0} is not hostile")]
    NotHostile(Position),

    /// Target cell is empty.
    #[error("no target at {0}")]
    NoTarget(Position),

    /// Unit kind cannot gather.
    #[error("unit {0} cannot gather resources")]
    NotAGatherer(UnitId),

    /// No resource node within reach of the unit.
    #[error("no resource node adjacent to unit {0}")]
    NoAdjacentNode(UnitId),

    /// Every adjacent node is empty.
    #[error("adjacent resource node is depleted")]
    NodeDepleted,

    /// The unit gathered from every adjacent node too recently.
    #[error("unit {0} is still on gather cooldown")]
    GatherCooldown(UnitId),

    /// Unit id does not refer to a live unit.
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    /// Player id does not refer to a seat.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
}

impl Rejection {
    /// Stable reason code for collaborators.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GameNotStarted => "game_not_started",
            Self::AlreadyStarted => "already_started",
            Self::GameOver => "game_over",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::Occupied(_) => "occupied",
            Self::InsufficientActions { .. } => "insufficient_actions",
            Self::PlayerActionsExhausted => "player_actions_exhausted",
            Self::WrongPhase { .. } => "wrong_phase",
            Self::NotCurrentPlayer(_) => "not_current_player",
            Self::InsufficientEnergy { .. } => "insufficient_energy",
            Self::SpawnTooFar(_) => "spawn_too_far",
            Self::NoBase(_) => "no_base",
            Self::NotAdjacent(_) => "not_adjacent",
            Self::NotHostile(_) => "not_hostile",
            Self::NoTarget(_) => "no_target",
            Self::NotAGatherer(_) => "not_a_gatherer",
            Self::NoAdjacentNode(_) => "no_adjacent_node",
            Self::NodeDepleted => "node_depleted",
            Self::GatherCooldown(_) => "gather_cooldown",
            Self::UnknownUnit(_) => "unknown_unit",
            Self::UnknownPlayer(_) => "unknown_player",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_codes_are_snake_case() {
        let samples = [
            Rejection::GameOver,
            Rejection::OutOfBounds { x: -1, y: 3 },
            Rejection::Occupied(Position::new(1, 1)),
            Rejection::WrongPhase {
                required: Phase::Action,
                current: Phase::Build,
            },
            Rejection::GatherCooldown(UnitId::new(4)),
        ];

        for rejection in samples {
            let code = rejection.code();
            assert!(!code.is_empty());
            assert!(code.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_rejection_display() {
        let msg = Rejection::InsufficientActions {
            required: 3,
            available: 2,
        }
        .to_string();
        assert_eq!(msg, "unit needs 3 actions but has 2");
    }

    #[test]
    fn test_board_mismatch_display() {
        let err = GameError::BoardMismatch {
            position: Position::new(2, 3),
            expected: "U1".into(),
            found: "empty".into(),
        };
        assert!(err.to_string().contains("(2, 3)"));
    }
}
