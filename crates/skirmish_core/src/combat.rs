//! Melee combat.
//!
//! Attacks reach the 8 surrounding cells (Chebyshev distance 1, diagonals
//! included). Damage is a fixed per-kind constant with no randomness and no
//! modifiers for the target: an Infantry hit takes 2 health from a Worker
//! and 2 from a base alike.
//!
//! Every attack costs exactly one action from the attacker and one from its
//! player. A unit brought to zero health leaves the board immediately; a
//! base is flagged destroyed and its cell cleared.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{EntityRef, UnitId};
use crate::error::{CommandResult, Rejection};
use crate::events::GameEvent;
use crate::game::GameState;
use crate::grid::Position;
use crate::turn::Phase;
use crate::units::UnitKind;

/// Result of a resolved attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackReport {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Entity hit.
    pub target: EntityRef,
    /// Damage dealt.
    pub damage: u32,
    /// Target health after the hit.
    pub remaining_health: u32,
    /// Whether the target was destroyed.
    pub destroyed: bool,
}

/// Damage an attack by `kind` deals to any target.
#[must_use]
pub const fn damage_for(kind: UnitKind) -> u32 {
    kind.stats().damage
}

/// Check whether `attacker` may hit whatever stands on `target` right now.
/// Returns the entity that would be hit.
///
/// # Errors
///
/// Returns the [`Rejection`] that prevents the attack.
pub fn can_attack(
    state: &GameState,
    attacker: UnitId,
    target: Position,
) -> CommandResult<EntityRef> {
    let unit = state.actor(attacker, Phase::Action)?;
    if !state.board().in_bounds(target) {
        return Err(Rejection::OutOfBounds {
            x: target.x,
            y: target.y,
        });
    }
    if unit.position.chebyshev_distance(target) != 1 {
        return Err(Rejection::NotAdjacent(target));
    }
    let entity = state.board().get(target).ok_or(Rejection::NoTarget(target))?;
    if state.owner_at(target) == Some(unit.owner) {
        return Err(Rejection::NotHostile(target));
    }
    if unit.remaining_actions() == 0 {
        return Err(Rejection::InsufficientActions {
            required: 1,
            available: 0,
        });
    }
    if state
        .player(unit.owner)
        .map_or(true, |player| player.actions_remaining == 0)
    {
        return Err(Rejection::PlayerActionsExhausted);
    }
    Ok(entity)
}

/// Cells around `attacker` it could attack right now, row-major.
#[must_use]
pub fn valid_targets(state: &GameState, attacker: UnitId) -> Vec<Position> {
    let Some(unit) = state.unit(attacker) else {
        return Vec::new();
    };
    unit.position
        .neighbors8()
        .into_iter()
        .filter(|&cell| can_attack(state, attacker, cell).is_ok())
        .collect()
}

/// Validate and resolve an attack. Nothing changes on rejection.
///
/// Victory is not evaluated here; the engine does that once the events of
/// the attack are recorded.
pub(crate) fn attack(
    state: &mut GameState,
    attacker: UnitId,
    target: Position,
    events: &mut Vec<GameEvent>,
) -> CommandResult<AttackReport> {
    let entity = can_attack(state, attacker, target)?;
    let (kind, owner) = state
        .unit(attacker)
        .map(|unit| (unit.kind, unit.owner))
        .ok_or(Rejection::UnknownUnit(attacker))?;
    let damage = damage_for(kind);

    let hit = state
        .apply_damage(entity, damage)
        .ok_or(Rejection::NoTarget(target))?;
    if let Some(unit) = state.unit_mut(attacker) {
        unit.spend_actions(1);
    }
    if let Some(player) = state.player_mut(owner) {
        player.use_action();
    }

    let report = AttackReport {
        attacker,
        target: entity,
        damage,
        remaining_health: hit.remaining_health,
        destroyed: hit.destroyed,
    };
    debug!(
        attacker = %attacker,
        %target,
        %entity,
        damage,
        remaining = hit.remaining_health,
        "Attack resolved"
    );
    events.push(GameEvent::UnitAttacked {
        attacker,
        target: entity,
        damage,
        remaining_health: hit.remaining_health,
        destroyed: hit.destroyed,
    });

    if hit.destroyed {
        match entity {
            EntityRef::Unit(id) => {
                if let Some(dead) = state.remove_unit(id) {
                    events.push(GameEvent::UnitRemoved {
                        unit: id,
                        owner: dead.owner,
                        position: dead.position,
                    });
                }
            }
            EntityRef::Base(id) => {
                if let Some(base) = state.bases().find(|base| base.id == id) {
                    events.push(GameEvent::BaseDestroyed {
                        base: id,
                        owner: base.owner,
                        position: base.position,
                    });
                }
            }
        }
    }
    Ok(report)
}
