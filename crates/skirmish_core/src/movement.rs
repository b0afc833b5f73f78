//! Movement rules.
//!
//! A unit may relocate to any empty, in-bounds cell whose Manhattan distance
//! does not exceed its remaining actions. The full distance is charged to
//! the unit and one action to its player. There is no pathfinding: the
//! cells in between are irrelevant.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::entities::UnitId;
use crate::error::{CommandResult, Rejection};
use crate::events::GameEvent;
use crate::game::GameState;
use crate::grid::Position;
use crate::turn::Phase;

/// A legal destination and what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveOption {
    /// Destination cell.
    pub position: Position,
    /// Actions the move would consume.
    pub cost: u32,
}

/// Empty cells within `allowance` Manhattan steps of `from`, row-major.
///
/// Scans the bounding box of the allowance and filters by distance, so the
/// work is proportional to `allowance²` rather than to the board size.
pub fn reachable(
    board: &Board,
    from: Position,
    allowance: u32,
) -> impl Iterator<Item = MoveOption> + '_ {
    let reach = i32::try_from(allowance).unwrap_or(i32::MAX);
    let max_x = i32::try_from(board.width()).unwrap_or(i32::MAX) - 1;
    let max_y = i32::try_from(board.height()).unwrap_or(i32::MAX) - 1;
    let x_range = from.x.saturating_sub(reach).max(0)..=from.x.saturating_add(reach).min(max_x);
    let y_range = from.y.saturating_sub(reach).max(0)..=from.y.saturating_add(reach).min(max_y);
    y_range
        .flat_map(move |y| x_range.clone().map(move |x| Position::new(x, y)))
        .filter_map(move |pos| {
            let cost = from.manhattan_distance(pos);
            (cost > 0 && cost <= allowance && board.is_empty(pos))
                .then_some(MoveOption { position: pos, cost })
        })
}

/// Check whether `unit` may move to `to` right now. Returns the cost.
///
/// # Errors
///
/// Returns the [`Rejection`] that prevents the move.
pub fn can_move(state: &GameState, unit: UnitId, to: Position) -> CommandResult<u32> {
    let mover = state.actor(unit, Phase::Action)?;
    if !state.board().in_bounds(to) {
        return Err(Rejection::OutOfBounds { x: to.x, y: to.y });
    }
    if !state.board().is_empty(to) {
        return Err(Rejection::Occupied(to));
    }
    let cost = mover.position.manhattan_distance(to);
    let available = mover.remaining_actions();
    if cost > available {
        return Err(Rejection::InsufficientActions {
            required: cost,
            available,
        });
    }
    if state
        .player(mover.owner)
        .map_or(true, |player| player.actions_remaining == 0)
    {
        return Err(Rejection::PlayerActionsExhausted);
    }
    Ok(cost)
}

/// Every destination `unit` could move to right now, each with its cost.
///
/// Empty when the unit cannot move at all (wrong phase, not its owner's
/// turn, or the player's budget is spent).
#[must_use]
pub fn valid_moves(state: &GameState, unit: UnitId) -> Vec<MoveOption> {
    let Ok(mover) = state.actor(unit, Phase::Action) else {
        return Vec::new();
    };
    if state
        .player(mover.owner)
        .map_or(true, |player| player.actions_remaining == 0)
    {
        return Vec::new();
    }
    reachable(state.board(), mover.position, mover.remaining_actions()).collect()
}

/// Validate and perform a move. Nothing changes on rejection.
pub(crate) fn move_unit(
    state: &mut GameState,
    unit: UnitId,
    to: Position,
    events: &mut Vec<GameEvent>,
) -> CommandResult<u32> {
    let cost = can_move(state, unit, to)?;
    let owner = state.unit(unit).map(|u| u.owner).ok_or(Rejection::UnknownUnit(unit))?;

    let from = state
        .relocate_unit(unit, to)
        .map_err(|_| Rejection::Occupied(to))?;
    if let Some(mover) = state.unit_mut(unit) {
        mover.spend_actions(cost);
    }
    if let Some(player) = state.player_mut(owner) {
        player.use_action();
    }

    debug!(unit = %unit, %from, %to, cost, "Unit moved");
    events.push(GameEvent::UnitMoved { unit, from, to, cost });
    Ok(cost)
}
