//! The command and query surface.
//!
//! [`Engine`] wraps a [`GameState`] and an [`EventBus`]. Every command
//! validates first and mutates only on success, so a rejected command leaves
//! the state untouched and publishes nothing. Events recorded while a
//! command runs are published synchronously before it returns.
//!
//! # Example
//!
//! ```
//! use skirmish_core::prelude::*;
//!
//! let mut engine = Engine::new("demo", GameConfig::default()).unwrap();
//! engine.start_game().unwrap();
//!
//! // resource -> action -> build
//! engine.advance_phase().unwrap();
//! engine.advance_phase().unwrap();
//!
//! let worker = engine
//!     .create_unit(UnitKind::Worker, PlayerId::ONE, Position::new(6, 6))
//!     .unwrap();
//! assert_eq!(engine.unit_at(Position::new(6, 6)).map(|u| u.id), Some(worker));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::{self, AttackReport};
use crate::config::GameConfig;
use crate::economy::{self, GatherReport};
use crate::entities::{Base, EntityRef, PlayerId, Unit, UnitId};
use crate::error::{CommandResult, Rejection, Result};
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::game::GameState;
use crate::grid::Position;
use crate::movement::{self, MoveOption};
use crate::production;
use crate::snapshot::Snapshot;
use crate::turn::{self, GameStatus, TurnPosition};
use crate::units::UnitKind;
use crate::victory::{self, Outcome};

/// A command as data, for batches, replays and remote callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    /// Leave the `ready` state.
    StartGame,
    /// Build a unit.
    CreateUnit {
        /// Kind to build.
        kind: UnitKind,
        /// Paying player.
        player: PlayerId,
        /// Spawn cell.
        at: Position,
    },
    /// Move a unit.
    MoveUnit {
        /// Unit to move.
        unit: UnitId,
        /// Destination.
        to: Position,
    },
    /// Attack an adjacent cell.
    AttackUnit {
        /// Attacking unit.
        unit: UnitId,
        /// Target cell.
        target: Position,
    },
    /// Gather from an adjacent node.
    GatherResource {
        /// Gathering worker.
        unit: UnitId,
    },
    /// Step the phase machine.
    AdvancePhase,
    /// Concede.
    Surrender {
        /// Conceding player.
        player: PlayerId,
    },
    /// Agree to a draw.
    DeclareDraw,
}

impl Command {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartGame => "start_game",
            Self::CreateUnit { .. } => "create_unit",
            Self::MoveUnit { .. } => "move_unit",
            Self::AttackUnit { .. } => "attack_unit",
            Self::GatherResource { .. } => "gather_resource",
            Self::AdvancePhase => "advance_phase",
            Self::Surrender { .. } => "player_surrender",
            Self::DeclareDraw => "declare_draw",
        }
    }
}

/// Payload of an accepted [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandOutcome {
    /// The game started.
    Started(TurnPosition),
    /// A unit was built.
    UnitCreated(UnitId),
    /// A unit moved at this cost.
    Moved {
        /// Unit that moved.
        unit: UnitId,
        /// Actions charged.
        cost: u32,
    },
    /// An attack resolved.
    Attacked(AttackReport),
    /// A worker gathered.
    Gathered(GatherReport),
    /// The phase advanced.
    PhaseAdvanced(TurnPosition),
    /// A surrender was recorded.
    Surrendered(Outcome),
    /// A draw was recorded.
    DrawDeclared(Outcome),
}

/// Game engine: state, listeners and the command/query API.
#[derive(Debug)]
pub struct Engine {
    state: GameState,
    bus: EventBus,
    pending: Vec<GameEvent>,
    in_batch: bool,
    victory_pending: bool,
}

impl Engine {
    /// Create an engine for a fresh game.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(game_id: impl Into<String>, config: GameConfig) -> Result<Self> {
        Ok(Self::from_state(GameState::new(game_id, config)?))
    }

    /// Wrap an existing state.
    #[must_use]
    pub fn from_state(state: GameState) -> Self {
        Self {
            state,
            bus: EventBus::new(),
            pending: Vec::new(),
            in_batch: false,
            victory_pending: false,
        }
    }

    /// Restore an engine from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is inconsistent.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        Ok(Self::from_state(snapshot.restore()?))
    }

    /// Restore an engine from snapshot JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or is inconsistent.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_snapshot(Snapshot::from_json(json)?)
    }

    /// Capture the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Capture the current state as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        self.snapshot().to_json()
    }

    /// Read-only view of the whole state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Current result.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    /// Deterministic hash of the current state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    // Events

    /// Register a listener for one event kind.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.bus.subscribe(kind, listener)
    }

    /// Register a listener for every event.
    pub fn subscribe_all<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.bus.subscribe_all(listener)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // Commands

    /// Move the game from `ready` to `playing` and open player 1's turn.
    ///
    /// # Errors
    ///
    /// Rejected if the game has already started or ended.
    pub fn start_game(&mut self) -> CommandResult<TurnPosition> {
        let position = self.run("start_game", |state, events| match state.status() {
            GameStatus::Playing => Err(Rejection::AlreadyStarted),
            GameStatus::Ended => Err(Rejection::GameOver),
            GameStatus::Ready => Ok(turn::start(state, events)),
        })?;
        info!(game = self.state.game_id(), "Game started");
        Ok(position)
    }

    /// Build a unit for `player` at `at`.
    ///
    /// # Errors
    ///
    /// Rejected outside the player's build phase, without enough energy, or
    /// when the cell is unusable.
    pub fn create_unit(
        &mut self,
        kind: UnitKind,
        player: PlayerId,
        at: Position,
    ) -> CommandResult<UnitId> {
        self.run("create_unit", |state, events| {
            production::create_unit(state, kind, player, at, events)
        })
    }

    /// Move a unit. Returns the actions charged.
    ///
    /// # Errors
    ///
    /// Rejected unless the move is legal right now; see [`movement::can_move`].
    pub fn move_unit(&mut self, unit: UnitId, to: Position) -> CommandResult<u32> {
        self.run("move_unit", |state, events| {
            movement::move_unit(state, unit, to, events)
        })
    }

    /// Attack the entity on `target`.
    ///
    /// # Errors
    ///
    /// Rejected unless the attack is legal right now; see [`combat::can_attack`].
    pub fn attack_unit(&mut self, unit: UnitId, target: Position) -> CommandResult<AttackReport> {
        let report = self.run("attack_unit", |state, events| {
            combat::attack(state, unit, target, events)
        })?;
        self.check_victory();
        Ok(report)
    }

    /// Gather with a worker.
    ///
    /// # Errors
    ///
    /// Rejected unless gathering is legal right now; see [`economy::can_gather`].
    pub fn gather_resource(&mut self, unit: UnitId) -> CommandResult<GatherReport> {
        self.run("gather_resource", |state, events| {
            economy::gather(state, unit, events)
        })
    }

    /// Step to the next phase, handing over to the opponent after `build`.
    ///
    /// # Errors
    ///
    /// Rejected unless the game is in progress.
    pub fn advance_phase(&mut self) -> CommandResult<TurnPosition> {
        let (position, hand_off) = self.run("advance_phase", |state, events| {
            state.ensure_playing()?;
            Ok(turn::advance(state, events))
        })?;
        if hand_off {
            self.check_victory();
        }
        Ok(position)
    }

    /// Record a surrender by `player`.
    ///
    /// # Errors
    ///
    /// Rejected unless the game is in progress and `player` is a seat.
    pub fn player_surrender(&mut self, player: PlayerId) -> CommandResult<Outcome> {
        self.run("player_surrender", |state, events| {
            state.ensure_playing()?;
            if !player.is_seat() {
                return Err(Rejection::UnknownPlayer(player));
            }
            state.record_surrender(player);
            events.push(GameEvent::PlayerSurrendered { player });
            Ok(())
        })?;
        self.check_victory();
        Ok(self.state.outcome())
    }

    /// Record a mutual draw.
    ///
    /// # Errors
    ///
    /// Rejected unless the game is in progress.
    pub fn declare_draw(&mut self) -> CommandResult<Outcome> {
        self.run("declare_draw", |state, events| {
            state.ensure_playing()?;
            state.record_draw_agreement();
            events.push(GameEvent::DrawDeclared);
            Ok(())
        })?;
        self.check_victory();
        Ok(self.state.outcome())
    }

    /// Run one command given as data.
    ///
    /// # Errors
    ///
    /// Returns the command's rejection.
    pub fn apply(&mut self, command: Command) -> CommandResult<CommandOutcome> {
        match command {
            Command::StartGame => self.start_game().map(CommandOutcome::Started),
            Command::CreateUnit { kind, player, at } => self
                .create_unit(kind, player, at)
                .map(CommandOutcome::UnitCreated),
            Command::MoveUnit { unit, to } => self
                .move_unit(unit, to)
                .map(|cost| CommandOutcome::Moved { unit, cost }),
            Command::AttackUnit { unit, target } => self
                .attack_unit(unit, target)
                .map(CommandOutcome::Attacked),
            Command::GatherResource { unit } => {
                self.gather_resource(unit).map(CommandOutcome::Gathered)
            }
            Command::AdvancePhase => self.advance_phase().map(CommandOutcome::PhaseAdvanced),
            Command::Surrender { player } => self
                .player_surrender(player)
                .map(CommandOutcome::Surrendered),
            Command::DeclareDraw => self.declare_draw().map(CommandOutcome::DrawDeclared),
        }
    }

    /// Run several commands as one batch.
    ///
    /// Victory is arbitrated once, after the last command, so effects that
    /// land in the same batch (two bases falling, say) resolve together and
    /// `gameEnded` fires at most once. Each command still succeeds or fails
    /// on its own.
    pub fn apply_batch(&mut self, commands: &[Command]) -> Vec<CommandResult<CommandOutcome>> {
        self.in_batch = true;
        self.victory_pending = false;
        let results = commands.iter().map(|&command| self.apply(command)).collect();
        self.in_batch = false;

        if std::mem::take(&mut self.victory_pending) && self.state.status() == GameStatus::Playing {
            victory::arbitrate(&mut self.state, &mut self.pending);
            self.flush();
        }
        results
    }

    // Queries

    /// The live unit on `at`, if any.
    #[must_use]
    pub fn unit_at(&self, at: Position) -> Option<&Unit> {
        self.state.unit_at(at)
    }

    /// Whatever occupies `at`.
    #[must_use]
    pub fn entity_at(&self, at: Position) -> Option<EntityRef> {
        self.state.board().get(at)
    }

    /// True if `at` is on the board and empty.
    #[must_use]
    pub fn is_position_empty(&self, at: Position) -> bool {
        self.state.board().is_empty(at)
    }

    /// Destinations `unit` could move to right now.
    #[must_use]
    pub fn valid_move_positions(&self, unit: UnitId) -> Vec<MoveOption> {
        movement::valid_moves(&self.state, unit)
    }

    /// Cells `unit` could attack right now.
    #[must_use]
    pub fn valid_attack_targets(&self, unit: UnitId) -> Vec<Position> {
        combat::valid_targets(&self.state, unit)
    }

    /// Live units owned by `player`, in id order.
    #[must_use]
    pub fn player_units(&self, player: PlayerId) -> Vec<&Unit> {
        self.state.units_of(player).collect()
    }

    /// The base of `player`, standing or destroyed.
    #[must_use]
    pub fn player_base(&self, player: PlayerId) -> Option<&Base> {
        self.state.base_of(player)
    }

    fn run<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut GameState, &mut Vec<GameEvent>) -> CommandResult<T>,
    ) -> CommandResult<T> {
        let result = op(&mut self.state, &mut self.pending);
        match &result {
            Ok(_) => debug!(command = name, "Command accepted"),
            Err(rejection) => {
                self.pending.clear();
                debug!(command = name, reason = rejection.code(), %rejection, "Command rejected");
            }
        }
        self.flush();
        result
    }

    fn check_victory(&mut self) {
        if self.state.status() != GameStatus::Playing {
            return;
        }
        if self.in_batch {
            self.victory_pending = true;
            return;
        }
        victory::arbitrate(&mut self.state, &mut self.pending);
        self.flush();
    }

    fn flush(&mut self) {
        #[cfg(feature = "debug-validation")]
        if let Err(err) = self.state.check_invariants() {
            tracing::error!(%err, "State invariant violated");
        }

        for event in std::mem::take(&mut self.pending) {
            self.bus.publish(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::turn::Phase;

    fn started() -> Engine {
        let mut engine = Engine::new("engine", GameConfig::default()).unwrap();
        engine.start_game().unwrap();
        engine
    }

    #[test]
    fn test_commands_need_started_game() {
        let mut engine = Engine::new("engine", GameConfig::default()).unwrap();
        assert_eq!(engine.advance_phase(), Err(Rejection::GameNotStarted));
        assert_eq!(engine.declare_draw(), Err(Rejection::GameNotStarted));
        engine.start_game().unwrap();
        assert_eq!(engine.start_game(), Err(Rejection::AlreadyStarted));
    }

    #[test]
    fn test_events_published_in_order() {
        let mut engine = Engine::new("engine", GameConfig::default()).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        engine.subscribe_all(move |event| sink.borrow_mut().push(event.kind()));

        engine.start_game().unwrap();
        engine.advance_phase().unwrap();

        assert_eq!(
            *log.borrow(),
            vec![EventKind::GameStarted, EventKind::PhaseChanged, EventKind::PhaseChanged]
        );
    }

    #[test]
    fn test_rejection_publishes_nothing() {
        let mut engine = started();
        let log = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&log);
        engine.subscribe_all(move |_| *sink.borrow_mut() += 1);

        let before = engine.state_hash();
        assert!(engine
            .create_unit(UnitKind::Worker, PlayerId::ONE, Position::new(6, 6))
            .is_err());
        assert_eq!(*log.borrow(), 0);
        assert_eq!(engine.state_hash(), before);
    }

    #[test]
    fn test_draw_ends_game() {
        let mut engine = started();
        assert_eq!(engine.declare_draw(), Ok(Outcome::Draw));
        assert_eq!(engine.state().status(), GameStatus::Ended);
        assert_eq!(engine.advance_phase(), Err(Rejection::GameOver));
        assert_eq!(engine.player_surrender(PlayerId::ONE), Err(Rejection::GameOver));
        assert_eq!(engine.outcome(), Outcome::Draw);
    }

    #[test]
    fn test_apply_dispatches() {
        let mut engine = started();
        let outcome = engine.apply(Command::AdvancePhase).unwrap();
        assert!(matches!(
            outcome,
            CommandOutcome::PhaseAdvanced(TurnPosition {
                phase: Phase::Action,
                ..
            })
        ));
    }
}
