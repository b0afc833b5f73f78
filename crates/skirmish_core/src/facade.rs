//! Seat-bound player interface.
//!
//! [`PlayerFacade`] is what a human client, a scripted opponent or a test
//! harness uses to play one side. It exposes the same commands for every
//! kind of player and refuses anything that would act for the other seat,
//! so a controller cannot move enemy units or end the opponent's phase.
//!
//! All commands still flow through [`Engine::apply`], which keeps facade
//! play replayable.

use crate::engine::{Command, CommandOutcome, Engine};
use crate::entities::{PlayerId, UnitId};
use crate::error::{CommandResult, Rejection};
use crate::grid::Position;
use crate::units::UnitKind;

/// What a player can see of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInfo {
    /// Unit id.
    pub id: UnitId,
    /// Kind.
    pub kind: UnitKind,
    /// Owner.
    pub owner: PlayerId,
    /// Cell.
    pub position: Position,
    /// Current health.
    pub health: u32,
    /// Actions left this turn.
    pub remaining_actions: u32,
}

/// Everything one seat may do and see.
pub trait PlayerFacade {
    /// The seat this facade plays.
    fn seat(&self) -> PlayerId;

    /// Issue a command on behalf of this seat.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::NotCurrentPlayer`] naming this seat when the
    /// command would act for the other seat, otherwise the engine's own
    /// rejection.
    fn issue(&mut self, command: Command) -> CommandResult<CommandOutcome>;

    /// Issue commands in order, stopping at the first rejection.
    ///
    /// # Errors
    ///
    /// Returns the first rejection. Earlier commands stay applied.
    fn issue_all(&mut self, commands: &[Command]) -> CommandResult<Vec<CommandOutcome>> {
        commands.iter().map(|&command| self.issue(command)).collect()
    }

    /// This seat's live units.
    fn own_units(&self) -> Vec<UnitInfo>;

    /// The opponent's live units.
    fn enemy_units(&self) -> Vec<UnitInfo>;

    /// This seat's energy.
    fn energy(&self) -> u32;

    /// Whether this seat is the current player.
    fn is_my_turn(&self) -> bool;
}

/// [`PlayerFacade`] over a borrowed [`Engine`].
#[derive(Debug)]
pub struct SeatHandle<'a> {
    engine: &'a mut Engine,
    seat: PlayerId,
}

impl<'a> SeatHandle<'a> {
    /// Bind `engine` to `seat`.
    pub fn new(engine: &'a mut Engine, seat: PlayerId) -> Self {
        Self { engine, seat }
    }

    /// Read-only access to the engine.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        self.engine
    }

    /// Seat that `command` would act for, if it acts for one in particular.
    fn acting_seat(&self, command: &Command) -> Option<PlayerId> {
        let state = self.engine.state();
        match *command {
            Command::CreateUnit { player, .. } | Command::Surrender { player } => Some(player),
            Command::MoveUnit { unit, .. }
            | Command::AttackUnit { unit, .. }
            | Command::GatherResource { unit } => state.unit(unit).map(|u| u.owner),
            Command::AdvancePhase => Some(state.current_player()),
            Command::StartGame | Command::DeclareDraw => None,
        }
    }

    fn units_where(&self, keep: impl Fn(PlayerId) -> bool) -> Vec<UnitInfo> {
        self.engine
            .state()
            .units()
            .filter(|unit| keep(unit.owner))
            .map(|unit| UnitInfo {
                id: unit.id,
                kind: unit.kind,
                owner: unit.owner,
                position: unit.position,
                health: unit.health.current,
                remaining_actions: unit.remaining_actions(),
            })
            .collect()
    }
}

impl PlayerFacade for SeatHandle<'_> {
    fn seat(&self) -> PlayerId {
        self.seat
    }

    fn issue(&mut self, command: Command) -> CommandResult<CommandOutcome> {
        if self.acting_seat(&command).is_some_and(|seat| seat != self.seat) {
            return Err(Rejection::NotCurrentPlayer(self.seat));
        }
        self.engine.apply(command)
    }

    fn own_units(&self) -> Vec<UnitInfo> {
        self.units_where(|owner| owner == self.seat)
    }

    fn enemy_units(&self) -> Vec<UnitInfo> {
        self.units_where(|owner| owner != self.seat)
    }

    fn energy(&self) -> u32 {
        self.engine
            .state()
            .player(self.seat)
            .map_or(0, |player| player.energy)
    }

    fn is_my_turn(&self) -> bool {
        self.engine.state().current_player() == self.seat
    }
}
