//! The game state aggregate.
//!
//! [`GameState`] owns every player, unit, base and resource node together
//! with the [`Board`] that indexes them by cell. Entity collections are
//! arenas keyed by id; the board is the coordinate index. Everything that
//! touches both goes through the methods here so the two never disagree.
//!
//! Collaborators only get shared references or copies. Mutation is
//! crate-private and driven by the engine's commands.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use crate::board::Board;
use crate::config::GameConfig;
use crate::entities::{
    Base, BaseId, EntityRef, NodeId, Player, PlayerId, ResourceNode, Unit, UnitId,
};
use crate::error::{CommandResult, GameError, Rejection, Result};
use crate::grid::Position;
use crate::turn::{GameStatus, Phase, TurnPosition};
use crate::units::UnitKind;
use crate::victory::{Outcome, VictoryReason};

/// What a hit did to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DamageResult {
    pub remaining_health: u32,
    pub destroyed: bool,
}

/// Complete state of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub(crate) game_id: String,
    pub(crate) status: GameStatus,
    pub(crate) current_player: PlayerId,
    pub(crate) phase: Phase,
    pub(crate) turn_number: u32,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) bases: BTreeMap<BaseId, Base>,
    pub(crate) nodes: Vec<ResourceNode>,
    pub(crate) board: Board,
    pub(crate) outcome: Outcome,
    pub(crate) victory_reason: Option<VictoryReason>,
    pub(crate) surrendered: Option<PlayerId>,
    pub(crate) draw_agreed: bool,
    pub(crate) next_unit_id: u32,
    pub(crate) config: GameConfig,
}

impl GameState {
    /// Lay out a fresh game: both players, both bases and every resource
    /// node from `config`. The game starts in the `ready` status.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the config does not validate.
    pub fn new(game_id: impl Into<String>, config: GameConfig) -> Result<Self> {
        config.validate()?;

        let mut board = Board::new(config.width, config.height);
        let mut players = BTreeMap::new();
        let mut bases = BTreeMap::new();
        for (seat, name) in PlayerId::ALL.into_iter().zip(config.player_names.iter()) {
            players.insert(seat, Player::new(seat, name.clone(), config.starting_energy));

            let base_id = BaseId::new(u32::from(seat.get()));
            let position = config.base_positions[usize::from(seat.get() - 1)];
            board.place(position, EntityRef::Base(base_id))?;
            bases.insert(base_id, Base::new(base_id, seat, position, config.base_health));
        }

        let nodes = config
            .resource_nodes
            .iter()
            .zip(0u32..)
            .map(|(node, id)| {
                ResourceNode::new(
                    NodeId::new(id),
                    node.position,
                    node.value,
                    node.max_value,
                    node.regen_rate,
                )
            })
            .collect();

        Ok(Self {
            game_id: game_id.into(),
            status: GameStatus::Ready,
            current_player: PlayerId::ONE,
            phase: Phase::Resource,
            turn_number: 1,
            players,
            units: BTreeMap::new(),
            bases,
            nodes,
            board,
            outcome: Outcome::Unresolved,
            victory_reason: None,
            surrendered: None,
            draw_agreed: false,
            next_unit_id: 1,
            config,
        })
    }

    /// Game identifier.
    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn current_player(&self) -> PlayerId {
        self.current_player
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current turn number, starting at 1.
    #[must_use]
    pub const fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Current player, phase and turn together.
    #[must_use]
    pub const fn turn_position(&self) -> TurnPosition {
        TurnPosition {
            player: self.current_player,
            phase: self.phase,
            turn: self.turn_number,
        }
    }

    /// Result so far.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// What ended the game, once it has ended.
    #[must_use]
    pub const fn victory_reason(&self) -> Option<VictoryReason> {
        self.victory_reason
    }

    /// Player who surrendered, if any.
    #[must_use]
    pub const fn surrendered(&self) -> Option<PlayerId> {
        self.surrendered
    }

    /// Whether a draw has been agreed.
    #[must_use]
    pub const fn draw_agreed(&self) -> bool {
        self.draw_agreed
    }

    /// Rules this game was created with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Cell index.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Id the next created unit will receive.
    #[must_use]
    pub const fn next_unit_id(&self) -> u32 {
        self.next_unit_id
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Both players, in seat order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Look up a live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Every live unit, in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Live units owned by `player`, in id order.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |unit| unit.owner == player)
    }

    /// Every base, standing or destroyed.
    pub fn bases(&self) -> impl Iterator<Item = &Base> {
        self.bases.values()
    }

    /// The base of `player`, standing or destroyed.
    #[must_use]
    pub fn base_of(&self, player: PlayerId) -> Option<&Base> {
        self.bases.values().find(|base| base.owner == player)
    }

    /// Resource nodes, in id order.
    #[must_use]
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// The live unit standing on `pos`, if any.
    #[must_use]
    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        match self.board.get(pos)? {
            EntityRef::Unit(id) => self.units.get(&id),
            EntityRef::Base(_) => None,
        }
    }

    /// Owner of whatever stands on `pos`.
    #[must_use]
    pub fn owner_at(&self, pos: Position) -> Option<PlayerId> {
        match self.board.get(pos)? {
            EntityRef::Unit(id) => self.units.get(&id).map(|unit| unit.owner),
            EntityRef::Base(id) => self.bases.get(&id).map(|base| base.owner),
        }
    }

    /// Reject unless the game is in progress.
    pub(crate) fn ensure_playing(&self) -> CommandResult<()> {
        match self.status {
            GameStatus::Ready => Err(Rejection::GameNotStarted),
            GameStatus::Ended => Err(Rejection::GameOver),
            GameStatus::Playing => Ok(()),
        }
    }

    /// Reject unless the game is in `phase`.
    pub(crate) fn ensure_phase(&self, phase: Phase) -> CommandResult<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(Rejection::WrongPhase {
                required: phase,
                current: self.phase,
            })
        }
    }

    /// Resolve a unit that the current player may command in `phase`.
    pub(crate) fn actor(&self, id: UnitId, phase: Phase) -> CommandResult<&Unit> {
        self.ensure_playing()?;
        let unit = self.units.get(&id).ok_or(Rejection::UnknownUnit(id))?;
        if unit.owner != self.current_player {
            return Err(Rejection::NotCurrentPlayer(unit.owner));
        }
        self.ensure_phase(phase)?;
        Ok(unit)
    }

    pub(crate) fn set_status(&mut self, status: GameStatus) {
        self.status = status;
    }

    pub(crate) fn set_turn(&mut self, player: PlayerId, phase: Phase, turn: u32) {
        self.current_player = player;
        self.phase = phase;
        self.turn_number = turn;
    }

    pub(crate) fn set_outcome(&mut self, outcome: Outcome, reason: VictoryReason) {
        self.outcome = outcome;
        self.victory_reason = Some(reason);
        self.status = GameStatus::Ended;
    }

    pub(crate) fn record_surrender(&mut self, player: PlayerId) {
        self.surrendered = Some(player);
    }

    pub(crate) fn record_draw_agreement(&mut self) {
        self.draw_agreed = true;
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [ResourceNode] {
        &mut self.nodes
    }

    pub(crate) fn reset_unit_actions(&mut self, player: PlayerId) {
        for unit in self.units.values_mut().filter(|unit| unit.owner == player) {
            unit.reset_actions();
        }
    }

    /// Create a unit on an empty cell and register it with its owner.
    ///
    /// Performs no rule checks beyond board occupancy.
    pub(crate) fn spawn_unit(
        &mut self,
        kind: UnitKind,
        owner: PlayerId,
        position: Position,
    ) -> Result<UnitId> {
        if !owner.is_seat() {
            return Err(GameError::InvalidState(format!("No seat {owner}")));
        }
        let id = UnitId::new(self.next_unit_id);
        self.board.place(position, EntityRef::Unit(id))?;
        self.next_unit_id += 1;
        self.units.insert(id, Unit::new(id, kind, owner, position));
        if let Some(player) = self.players.get_mut(&owner) {
            player.units.insert(id);
        }
        Ok(id)
    }

    /// Move a unit's board entry and position together.
    pub(crate) fn relocate_unit(&mut self, id: UnitId, to: Position) -> Result<Position> {
        let from = self
            .units
            .get(&id)
            .map(|unit| unit.position)
            .ok_or_else(|| GameError::InvalidState(format!("No unit {id}")))?;
        self.board.relocate(from, to)?;
        if let Some(unit) = self.units.get_mut(&id) {
            unit.position = to;
        }
        Ok(from)
    }

    /// Remove a unit from the board, the arena, its owner and node cooldowns.
    pub(crate) fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        self.board.clear(unit.position);
        if let Some(player) = self.players.get_mut(&unit.owner) {
            player.units.remove(&id);
        }
        for node in &mut self.nodes {
            node.forget(id);
        }
        Some(unit)
    }

    /// Damage a unit or base. A destroyed base leaves the board but keeps
    /// its record and position.
    pub(crate) fn apply_damage(&mut self, target: EntityRef, amount: u32) -> Option<DamageResult> {
        match target {
            EntityRef::Unit(id) => {
                let unit = self.units.get_mut(&id)?;
                unit.health.apply_damage(amount);
                Some(DamageResult {
                    remaining_health: unit.health.current,
                    destroyed: unit.health.is_dead(),
                })
            }
            EntityRef::Base(id) => {
                let base = self.bases.get_mut(&id)?;
                let destroyed = base.apply_damage(amount);
                let result = DamageResult {
                    remaining_health: base.health.current,
                    destroyed,
                };
                if destroyed {
                    let position = base.position;
                    self.board.clear(position);
                }
                Some(result)
            }
        }
    }

    /// Deterministic hash of the whole state.
    ///
    /// Two states with identical contents always hash identically, which
    /// makes this suitable for replay verification.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.game_id.hash(&mut hasher);
        self.status.hash(&mut hasher);
        self.current_player.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.turn_number.hash(&mut hasher);
        self.next_unit_id.hash(&mut hasher);

        for player in self.players.values() {
            player.id.hash(&mut hasher);
            player.energy.hash(&mut hasher);
            player.actions_remaining.hash(&mut hasher);
            player.resources_gathered.hash(&mut hasher);
            player.units.hash(&mut hasher);
        }

        self.units.len().hash(&mut hasher);
        for unit in self.units.values() {
            unit.id.hash(&mut hasher);
            unit.kind.hash(&mut hasher);
            unit.owner.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.health.hash(&mut hasher);
            unit.actions_used.hash(&mut hasher);
        }

        for base in self.bases.values() {
            base.id.hash(&mut hasher);
            base.position.hash(&mut hasher);
            base.health.hash(&mut hasher);
            base.destroyed.hash(&mut hasher);
        }

        for node in &self.nodes {
            node.id.hash(&mut hasher);
            node.value.hash(&mut hasher);
            node.cooldowns.hash(&mut hasher);
        }

        self.board.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        self.victory_reason.hash(&mut hasher);
        self.surrendered.hash(&mut hasher);
        self.draw_agreed.hash(&mut hasher);

        hasher.finish()
    }

    /// Check that the board and the entity arenas agree.
    ///
    /// Every live unit and standing base must own exactly its own cell, no
    /// other cell may be occupied, and each player's unit set must match the
    /// units that name them as owner.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::BoardMismatch`] or [`GameError::InvalidState`]
    /// describing the first inconsistency.
    pub fn check_invariants(&self) -> Result<()> {
        let mut expected: BTreeMap<Position, EntityRef> = BTreeMap::new();
        for unit in self.units.values() {
            if unit.health.is_dead() {
                return Err(GameError::InvalidState(format!("Unit {} has no health", unit.id)));
            }
            if unit.actions_used > unit.max_actions() {
                return Err(GameError::InvalidState(format!(
                    "Unit {} used {} of {} actions",
                    unit.id,
                    unit.actions_used,
                    unit.max_actions()
                )));
            }
            if expected.insert(unit.position, EntityRef::Unit(unit.id)).is_some() {
                return Err(GameError::CellOccupied(unit.position));
            }
        }
        for base in self.bases.values().filter(|base| !base.destroyed) {
            if expected.insert(base.position, EntityRef::Base(base.id)).is_some() {
                return Err(GameError::CellOccupied(base.position));
            }
        }

        for (position, entity) in &expected {
            if self.board.get(*position) != Some(*entity) {
                return Err(GameError::BoardMismatch {
                    position: *position,
                    expected: entity.to_string(),
                    found: describe(self.board.get(*position)),
                });
            }
        }
        if self.board.occupied_count() != expected.len() {
            if let Some((position, entity)) = self
                .board
                .occupied()
                .find(|(position, _)| !expected.contains_key(position))
            {
                return Err(GameError::BoardMismatch {
                    position,
                    expected: "empty".to_string(),
                    found: entity.to_string(),
                });
            }
        }

        for player in self.players.values() {
            let owned: BTreeSet<UnitId> = self.units_of(player.id).map(|unit| unit.id).collect();
            if owned != player.units {
                return Err(GameError::InvalidState(format!(
                    "Player {} unit set does not match unit owners",
                    player.id
                )));
            }
        }
        Ok(())
    }
}

/// Render an optional cell occupant for diagnostics.
pub(crate) fn describe(cell: Option<EntityRef>) -> String {
    cell.map_or_else(|| "empty".to_string(), |entity| entity.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> GameState {
        GameState::new("test", GameConfig::default()).unwrap()
    }

    #[test]
    fn test_new_places_bases() {
        let state = new_state();
        assert_eq!(state.status(), GameStatus::Ready);
        assert_eq!(state.board().occupied_count(), 2);
        assert_eq!(
            state.board().get(Position::new(5, 5)),
            Some(EntityRef::Base(BaseId::new(1)))
        );
        assert_eq!(state.base_of(PlayerId::TWO).unwrap().position, Position::new(19, 19));
        assert_eq!(state.nodes().len(), 3);
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_spawn_and_remove_keep_index_consistent() {
        let mut state = new_state();
        let id = state
            .spawn_unit(UnitKind::Worker, PlayerId::ONE, Position::new(6, 6))
            .unwrap();
        assert_eq!(state.unit_at(Position::new(6, 6)).map(|u| u.id), Some(id));
        assert!(state.player(PlayerId::ONE).unwrap().units.contains(&id));
        state.check_invariants().unwrap();

        assert!(state
            .spawn_unit(UnitKind::Worker, PlayerId::TWO, Position::new(6, 6))
            .is_err());
        assert_eq!(state.next_unit_id(), 2);

        state.remove_unit(id).unwrap();
        assert!(state.board().is_empty(Position::new(6, 6)));
        assert!(state.player(PlayerId::ONE).unwrap().units.is_empty());
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_destroyed_base_leaves_board_but_keeps_record() {
        let mut state = new_state();
        let hit = state
            .apply_damage(EntityRef::Base(BaseId::new(2)), 100)
            .unwrap();
        assert!(hit.destroyed);
        assert_eq!(hit.remaining_health, 0);
        assert!(state.board().is_empty(Position::new(19, 19)));
        let base = state.base_of(PlayerId::TWO).unwrap();
        assert!(base.destroyed);
        assert_eq!(base.position, Position::new(19, 19));
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let a = new_state();
        let mut b = new_state();
        assert_eq!(a.state_hash(), b.state_hash());

        b.relocate_unit(UnitId::new(1), Position::new(0, 0)).unwrap_err();
        assert_eq!(a.state_hash(), b.state_hash());

        b.spawn_unit(UnitKind::Scout, PlayerId::ONE, Position::new(4, 4))
            .unwrap();
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_check_invariants_detects_stale_cell() {
        let mut state = new_state();
        state
            .board
            .place(Position::new(0, 0), EntityRef::Unit(UnitId::new(42)))
            .unwrap();
        assert!(matches!(
            state.check_invariants(),
            Err(GameError::BoardMismatch { .. })
        ));
    }
}
