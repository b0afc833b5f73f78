//! Unit production.
//!
//! During their build phase a player may spend energy to place a new unit
//! on an empty cell within `spawn_range` (Chebyshev) of their standing base.
//! New units start with a full action allowance.

use tracing::debug;

use crate::entities::{PlayerId, UnitId};
use crate::error::{CommandResult, Rejection};
use crate::events::GameEvent;
use crate::game::GameState;
use crate::grid::Position;
use crate::turn::Phase;
use crate::units::UnitKind;

/// Check whether `player` may build `kind` at `at` right now.
///
/// # Errors
///
/// Returns the [`Rejection`] that prevents the build.
pub fn can_create(
    state: &GameState,
    kind: UnitKind,
    player: PlayerId,
    at: Position,
) -> CommandResult<()> {
    state.ensure_playing()?;
    let builder = state.player(player).ok_or(Rejection::UnknownPlayer(player))?;
    if player != state.current_player() {
        return Err(Rejection::NotCurrentPlayer(player));
    }
    state.ensure_phase(Phase::Build)?;

    let cost = kind.stats().cost;
    if !builder.can_afford(cost) {
        return Err(Rejection::InsufficientEnergy {
            required: cost,
            available: builder.energy,
        });
    }
    if !state.board().in_bounds(at) {
        return Err(Rejection::OutOfBounds { x: at.x, y: at.y });
    }
    if !state.board().is_empty(at) {
        return Err(Rejection::Occupied(at));
    }
    let base = state
        .base_of(player)
        .filter(|base| !base.destroyed)
        .ok_or(Rejection::NoBase(player))?;
    if base.position.chebyshev_distance(at) > state.config().spawn_range {
        return Err(Rejection::SpawnTooFar(at));
    }
    Ok(())
}

/// Empty cells where `player` could place a unit, ignoring phase and cost.
pub fn spawn_cells(state: &GameState, player: PlayerId) -> impl Iterator<Item = Position> + '_ {
    let range = i32::try_from(state.config().spawn_range).unwrap_or(i32::MAX);
    let board = state.board();
    let max_x = i32::try_from(board.width()).unwrap_or(i32::MAX) - 1;
    let max_y = i32::try_from(board.height()).unwrap_or(i32::MAX) - 1;
    let origin = state
        .base_of(player)
        .filter(|base| !base.destroyed)
        .map(|base| base.position);
    origin.into_iter().flat_map(move |center| {
        let x_range =
            center.x.saturating_sub(range).max(0)..=center.x.saturating_add(range).min(max_x);
        let y_range =
            center.y.saturating_sub(range).max(0)..=center.y.saturating_add(range).min(max_y);
        y_range
            .flat_map(move |y| x_range.clone().map(move |x| Position::new(x, y)))
            .filter(move |cell| board.is_empty(*cell))
    })
}

/// Whether `player` could build some unit on some turn from here.
#[must_use]
pub fn can_build_anything(state: &GameState, player: PlayerId) -> bool {
    state
        .player(player)
        .is_some_and(|p| p.can_afford(UnitKind::cheapest_cost()))
        && spawn_cells(state, player).next().is_some()
}

/// Validate and perform a build. Nothing changes on rejection.
pub(crate) fn create_unit(
    state: &mut GameState,
    kind: UnitKind,
    player: PlayerId,
    at: Position,
    events: &mut Vec<GameEvent>,
) -> CommandResult<UnitId> {
    can_create(state, kind, player, at)?;

    let id = state
        .spawn_unit(kind, player, at)
        .map_err(|_| Rejection::Occupied(at))?;
    if let Some(builder) = state.player_mut(player) {
        builder.spend_energy(kind.stats().cost);
    }

    debug!(unit = %id, %kind, player = %player, %at, "Unit created");
    events.push(GameEvent::UnitCreated {
        unit: id,
        kind,
        owner: player,
        position: at,
    });
    Ok(id)
}
