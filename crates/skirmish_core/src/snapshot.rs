//! Snapshot codec.
//!
//! A [`Snapshot`] is a plain, self-describing record of a whole game,
//! serialized as camelCase JSON for persistence collaborators.
//!
//! Entity position fields are authoritative. On restore the board is rebuilt
//! from units and standing bases, then compared cell by cell with the stored
//! grid; any disagreement is a fatal [`GameError`], never silently repaired.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::board::Board;
use crate::config::GameConfig;
use crate::entities::{
    Base, BaseId, EntityRef, NodeId, Player, PlayerId, ResourceNode, Unit, UnitId,
};
use crate::error::{GameError, Result};
use crate::game::{describe, GameState};
use crate::grid::Position;
use crate::turn::{GameStatus, Phase};
use crate::victory::{Outcome, VictoryReason};

/// Serialized form of a [`GameState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Game identifier.
    pub game_id: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Player whose turn it is.
    pub current_player: PlayerId,
    /// Current phase.
    pub current_phase: Phase,
    /// Turn number.
    pub turn_number: u32,
    /// Players keyed by seat.
    pub players: BTreeMap<PlayerId, Player>,
    /// Live units keyed by id.
    pub units: BTreeMap<UnitId, Unit>,
    /// Bases keyed by id, destroyed ones included.
    pub bases: BTreeMap<BaseId, Base>,
    /// Resource nodes in id order.
    pub resource_nodes: Vec<ResourceNode>,
    /// Board rows (`board[y][x]`), `"U<n>"`, `"B<n>"` or `null`.
    pub board: Vec<Vec<Option<EntityRef>>>,
    /// `null` while unresolved, a seat number, or `"draw"`.
    pub winner: Option<Winner>,
    /// What ended the game.
    pub victory_reason: Option<VictoryReason>,
    /// Player who surrendered.
    pub surrendered: Option<PlayerId>,
    /// Whether a draw was agreed.
    pub draw_agreed: bool,
    /// Id the next unit will receive.
    pub next_unit_id: u32,
    /// Rules of the game.
    pub config: GameConfig,
}

/// Resolved winner field: a seat number or the string `"draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Winner {
    /// A seat won.
    Seat(PlayerId),
    /// Nobody won.
    Draw(DrawMarker),
}

/// The `"draw"` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMarker {
    /// Serialized as `"draw"`.
    #[serde(rename = "draw")]
    Draw,
}

impl Winner {
    fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Unresolved => None,
            Outcome::Winner(player) => Some(Self::Seat(player)),
            Outcome::Draw => Some(Self::Draw(DrawMarker::Draw)),
        }
    }

    fn into_outcome(winner: Option<Self>) -> Outcome {
        match winner {
            None => Outcome::Unresolved,
            Some(Self::Seat(player)) => Outcome::Winner(player),
            Some(Self::Draw(_)) => Outcome::Draw,
        }
    }
}

fn corrupted(message: impl Into<String>) -> GameError {
    GameError::SnapshotCorrupted(message.into())
}

impl Snapshot {
    /// Capture `state`.
    #[must_use]
    pub fn capture(state: &GameState) -> Self {
        Self {
            game_id: state.game_id.clone(),
            status: state.status,
            current_player: state.current_player,
            current_phase: state.phase,
            turn_number: state.turn_number,
            players: state.players.clone(),
            units: state.units.clone(),
            bases: state.bases.clone(),
            resource_nodes: state.nodes.clone(),
            board: state.board.to_rows(),
            winner: Winner::from_outcome(state.outcome),
            victory_reason: state.victory_reason,
            surrendered: state.surrendered,
            draw_agreed: state.draw_agreed,
            next_unit_id: state.next_unit_id,
            config: state.config.clone(),
        }
    }

    /// Encode as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Encode as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Decode from JSON. Missing fields are an error.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SnapshotParse`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            warn!(error = %e, "Snapshot failed to parse");
            GameError::SnapshotParse(e.to_string())
        })
    }

    /// Rebuild the game state, cross-checking every record.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SnapshotCorrupted`], [`GameError::BoardMismatch`]
    /// or [`GameError::InvalidConfig`] when the snapshot contradicts itself.
    pub fn restore(self) -> Result<GameState> {
        let game_id = self.game_id.clone();
        match self.rebuild() {
            Ok(state) => Ok(state),
            Err(err) => {
                warn!(game = %game_id, error = %err, "Snapshot rejected");
                Err(err)
            }
        }
    }

    fn rebuild(self) -> Result<GameState> {
        self.config.validate()?;
        let (width, height) = (self.config.width, self.config.height);

        if self.board.len() != height as usize
            || self.board.iter().any(|row| row.len() != width as usize)
        {
            return Err(corrupted(format!("board is not {width}x{height}")));
        }
        if !self.current_player.is_seat() {
            return Err(corrupted(format!(
                "current player {} is not a seat",
                self.current_player
            )));
        }
        if self.turn_number == 0 {
            return Err(corrupted("turn number must start at 1"));
        }

        let seats: Vec<PlayerId> = self.players.keys().copied().collect();
        if seats != PlayerId::ALL {
            return Err(corrupted("players must be exactly seats 1 and 2"));
        }
        if let Some((key, player)) = self.players.iter().find(|(key, player)| **key != player.id) {
            return Err(corrupted(format!("player key {key} holds player {}", player.id)));
        }

        let mut base_owners: Vec<PlayerId> = self.bases.values().map(|base| base.owner).collect();
        base_owners.sort_unstable();
        if base_owners != PlayerId::ALL {
            return Err(corrupted("each seat must own exactly one base"));
        }
        for (key, base) in &self.bases {
            if *key != base.id {
                return Err(corrupted(format!("base key {key} holds base {}", base.id)));
            }
            if base.destroyed != base.health.is_dead() {
                return Err(corrupted(format!(
                    "base {} destroyed flag disagrees with health",
                    base.id
                )));
            }
        }

        for (key, unit) in &self.units {
            if *key != unit.id {
                return Err(corrupted(format!("unit key {key} holds unit {}", unit.id)));
            }
            if !unit.owner.is_seat() {
                return Err(corrupted(format!("unit {} has no valid owner", unit.id)));
            }
            if unit.id.get() >= self.next_unit_id {
                return Err(corrupted(format!("unit {} is not below nextUnitId", unit.id)));
            }
            if unit.health.max != unit.stats().max_health {
                return Err(corrupted(format!(
                    "unit {} has the wrong maximum health",
                    unit.id
                )));
            }
        }

        for (index, node) in (0u32..).zip(&self.resource_nodes) {
            if node.id != NodeId::new(index) {
                return Err(corrupted(format!(
                    "resource node {index} is numbered {}",
                    node.id
                )));
            }
            if node.value > node.max_value {
                return Err(corrupted(format!(
                    "resource node {} exceeds its maximum",
                    node.id
                )));
            }
        }

        let outcome = Winner::into_outcome(self.winner);
        if let Outcome::Winner(player) = outcome {
            if !player.is_seat() {
                return Err(corrupted(format!("winner {player} is not a seat")));
            }
        }
        if let Some(player) = self.surrendered.filter(|player| !player.is_seat()) {
            return Err(corrupted(format!("surrendered player {player} is not a seat")));
        }
        let ended = self.status == GameStatus::Ended;
        if ended != outcome.is_resolved() || ended != self.victory_reason.is_some() {
            return Err(corrupted("status, winner and victory reason disagree"));
        }

        let mut board = Board::new(width, height);
        for unit in self.units.values() {
            place(&mut board, unit.position, EntityRef::Unit(unit.id))?;
        }
        for base in self.bases.values().filter(|base| !base.destroyed) {
            place(&mut board, base.position, EntityRef::Base(base.id))?;
        }
        for (y, row) in (0i32..).zip(&self.board) {
            for (x, stored) in (0i32..).zip(row) {
                let position = Position::new(x, y);
                let derived = board.get(position);
                if derived != *stored {
                    return Err(GameError::BoardMismatch {
                        position,
                        expected: describe(derived),
                        found: describe(*stored),
                    });
                }
            }
        }

        let state = GameState {
            game_id: self.game_id,
            status: self.status,
            current_player: self.current_player,
            phase: self.current_phase,
            turn_number: self.turn_number,
            players: self.players,
            units: self.units,
            bases: self.bases,
            nodes: self.resource_nodes,
            board,
            outcome,
            victory_reason: self.victory_reason,
            surrendered: self.surrendered,
            draw_agreed: self.draw_agreed,
            next_unit_id: self.next_unit_id,
            config: self.config,
        };
        state.check_invariants()?;
        Ok(state)
    }
}

fn place(board: &mut Board, position: Position, entity: EntityRef) -> Result<()> {
    board.place(position, entity).map_err(|err| match err {
        GameError::OutOfBounds(pos) => corrupted(format!("{entity} stands off the board at {pos}")),
        GameError::CellOccupied(pos) => corrupted(format!("{entity} shares cell {pos}")),
        other => other,
    })
}
