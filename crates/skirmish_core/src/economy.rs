//! Energy economy: passive income, node regeneration and worker gathering.
//!
//! All amounts are unsigned integers; node values never leave
//! `0..=max_value` and energy saturates instead of wrapping.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{NodeId, PlayerId, UnitId};
use crate::error::{CommandResult, Rejection};
use crate::events::GameEvent;
use crate::game::GameState;
use crate::turn::Phase;

/// Result of a successful gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherReport {
    /// Gathering unit.
    pub unit: UnitId,
    /// Node harvested.
    pub node: NodeId,
    /// Energy moved to the player.
    pub amount: u32,
}

/// Pick the node `unit` would gather from right now.
///
/// Nodes within Manhattan distance 1 are tried in id order; the first one
/// that is neither empty nor on cooldown for this unit wins.
///
/// # Errors
///
/// Returns the [`Rejection`] that prevents gathering. When several nodes are
/// in reach and none is usable, a cooldown is reported before depletion.
pub fn can_gather(state: &GameState, unit: UnitId) -> CommandResult<NodeId> {
    let gatherer = state.actor(unit, Phase::Resource)?;
    if !gatherer.kind.can_gather() {
        return Err(Rejection::NotAGatherer(unit));
    }
    if gatherer.remaining_actions() == 0 {
        return Err(Rejection::InsufficientActions {
            required: 1,
            available: 0,
        });
    }

    let mut in_reach = state
        .nodes()
        .iter()
        .filter(|node| node.position.manhattan_distance(gatherer.position) <= 1)
        .peekable();
    if in_reach.peek().is_none() {
        return Err(Rejection::NoAdjacentNode(unit));
    }

    let mut cooling = false;
    for node in in_reach {
        if node.is_depleted() {
            continue;
        }
        if node.on_cooldown(unit) {
            cooling = true;
            continue;
        }
        return Ok(node.id);
    }
    if cooling {
        Err(Rejection::GatherCooldown(unit))
    } else {
        Err(Rejection::NodeDepleted)
    }
}

/// Validate and perform a gather. Nothing changes on rejection.
pub(crate) fn gather(
    state: &mut GameState,
    unit: UnitId,
    events: &mut Vec<GameEvent>,
) -> CommandResult<GatherReport> {
    let node_id = can_gather(state, unit)?;
    let owner = state.unit(unit).map(|u| u.owner).ok_or(Rejection::UnknownUnit(unit))?;
    let requested = state.config().gather_amount;
    let cooldown = state.config().gather_cooldown_turns;

    let node = state
        .nodes_mut()
        .iter_mut()
        .find(|node| node.id == node_id)
        .ok_or(Rejection::NoAdjacentNode(unit))?;
    let amount = node.extract(requested);
    node.start_cooldown(unit, cooldown);

    if let Some(gatherer) = state.unit_mut(unit) {
        gatherer.spend_actions(1);
    }
    if let Some(player) = state.player_mut(owner) {
        player.gain_energy(amount);
        player.resources_gathered = player.resources_gathered.saturating_add(amount);
    }

    debug!(unit = %unit, node = %node_id, amount, "Resources gathered");
    events.push(GameEvent::ResourceGathered {
        unit,
        node: node_id,
        amount,
    });
    Ok(GatherReport {
        unit,
        node: node_id,
        amount,
    })
}

/// Resource-phase entry for `player`: passive income, node regeneration,
/// and one tick off the cooldowns of that player's units.
pub(crate) fn start_of_turn(state: &mut GameState, player: PlayerId) {
    let income = state.config().passive_income;
    let owned = state
        .player(player)
        .map(|p| p.units.clone())
        .unwrap_or_default();
    if let Some(p) = state.player_mut(player) {
        p.gain_energy(income);
    }
    for node in state.nodes_mut() {
        node.regenerate();
        node.tick_cooldowns(|unit| owned.contains(&unit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, NodeConfig};
    use crate::grid::Position;
    use crate::turn::GameStatus;
    use crate::units::UnitKind;

    fn resource_phase(nodes: Vec<NodeConfig>) -> GameState {
        let config = GameConfig {
            resource_nodes: nodes,
            ..GameConfig::default()
        };
        let mut state = GameState::new("economy", config).unwrap();
        state.set_status(GameStatus::Playing);
        state.set_turn(PlayerId::ONE, Phase::Resource, 1);
        state
    }

    fn node_at(x: i32, y: i32, value: u32) -> NodeConfig {
        NodeConfig {
            position: Position::new(x, y),
            value,
            max_value: 10,
            regen_rate: 1,
        }
    }

    #[test]
    fn test_gather_moves_energy() {
        let mut state = resource_phase(vec![node_at(10, 10, 5)]);
        let worker = state
            .spawn_unit(UnitKind::Worker, PlayerId::ONE, Position::new(10, 11))
            .unwrap();
        let energy = state.player(PlayerId::ONE).unwrap().energy;
        let mut events = Vec::new();

        let report = gather(&mut state, worker, &mut events).unwrap();
        assert_eq!(report.amount, 2);
        assert_eq!(state.nodes()[0].value, 3);
        let player = state.player(PlayerId::ONE).unwrap();
        assert_eq!(player.energy, energy + 2);
        assert_eq!(player.resources_gathered, 2);
        assert_eq!(state.unit(worker).unwrap().actions_used, 1);

        assert_eq!(
            gather(&mut state, worker, &mut events),
            Err(Rejection::GatherCooldown(worker))
        );
    }

    #[test]
    fn test_depleted_node_has_no_side_effects() {
        let mut state = resource_phase(vec![node_at(10, 10, 0)]);
        let worker = state
            .spawn_unit(UnitKind::Worker, PlayerId::ONE, Position::new(10, 10))
            .unwrap();
        let before = state.clone();
        let mut events = Vec::new();

        assert_eq!(gather(&mut state, worker, &mut events), Err(Rejection::NodeDepleted));
        assert_eq!(state, before);
        assert!(events.is_empty());
    }

    #[test]
    fn test_only_workers_gather_and_only_adjacent() {
        let mut state = resource_phase(vec![node_at(10, 10, 5)]);
        let infantry = state
            .spawn_unit(UnitKind::Infantry, PlayerId::ONE, Position::new(10, 11))
            .unwrap();
        let far = state
            .spawn_unit(UnitKind::Worker, PlayerId::ONE, Position::new(11, 11))
            .unwrap();

        assert_eq!(can_gather(&state, infantry), Err(Rejection::NotAGatherer(infantry)));
        assert_eq!(can_gather(&state, far), Err(Rejection::NoAdjacentNode(far)));

        state.set_turn(PlayerId::ONE, Phase::Action, 1);
        assert!(matches!(can_gather(&state, far), Err(Rejection::WrongPhase { .. })));
    }

    #[test]
    fn test_gather_falls_through_to_next_node() {
        let mut state = resource_phase(vec![node_at(10, 10, 0), node_at(12, 11, 4)]);
        let worker = state
            .spawn_unit(UnitKind::Worker, PlayerId::ONE, Position::new(11, 11))
            .unwrap();
        assert_eq!(can_gather(&state, worker), Ok(NodeId::new(1)));
    }

    #[test]
    fn test_start_of_turn_income_regen_and_cooldowns() {
        let mut state = resource_phase(vec![node_at(10, 10, 9)]);
        let mine = state
            .spawn_unit(UnitKind::Worker, PlayerId::ONE, Position::new(10, 11))
            .unwrap();
        let theirs = state
            .spawn_unit(UnitKind::Worker, PlayerId::TWO, Position::new(10, 9))
            .unwrap();
        state.nodes_mut()[0].start_cooldown(mine, 1);
        state.nodes_mut()[0].start_cooldown(theirs, 1);
        let energy = state.player(PlayerId::ONE).unwrap().energy;

        start_of_turn(&mut state, PlayerId::ONE);

        let node = &state.nodes()[0];
        assert_eq!(node.value, 10);
        assert!(!node.on_cooldown(mine));
        assert!(node.on_cooldown(theirs));
        assert_eq!(
            state.player(PlayerId::ONE).unwrap().energy,
            energy + state.config().passive_income
        );

        start_of_turn(&mut state, PlayerId::ONE);
        assert_eq!(state.nodes()[0].value, 10, "regeneration clamps at max");
    }
}
