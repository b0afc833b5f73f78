//! Victory arbitration.
//!
//! Conditions are checked in a fixed priority order and the first match
//! decides the game:
//!
//! 1. both bases destroyed: draw
//! 2. one base destroyed: its opponent wins
//! 3. a surrender is on record: the other player wins
//! 4. a draw was agreed: draw
//! 5. elimination (from the configured minimum turn): exactly one player has
//!    no units and cannot afford the cheapest one, so the other player wins
//! 6. stalemate: no player can move, attack or build, so the game is drawn

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::PlayerId;
use crate::events::GameEvent;
use crate::game::GameState;
use crate::movement;
use crate::production;
use crate::units::UnitKind;

/// Three-way game result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// No result yet.
    #[default]
    Unresolved,
    /// A player won.
    Winner(PlayerId),
    /// Nobody won.
    Draw,
}

impl Outcome {
    /// Whether the game has a result.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// The winning player, if there is one.
    #[must_use]
    pub const fn winner(self) -> Option<PlayerId> {
        match self {
            Self::Winner(player) => Some(player),
            _ => None,
        }
    }
}

/// Condition that ended the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VictoryReason {
    /// Both bases fell.
    MutualDestruction,
    /// One base fell.
    BaseDestroyed,
    /// A player conceded.
    Surrender,
    /// The players agreed to a draw.
    AgreedDraw,
    /// A player ran out of units and energy.
    Elimination,
    /// Nobody could act.
    Stalemate,
}

/// Evaluate every condition against `state` without changing it.
#[must_use]
pub fn evaluate(state: &GameState) -> Option<(Outcome, VictoryReason)> {
    let destroyed = |player| state.base_of(player).is_some_and(|base| base.destroyed);
    match (destroyed(PlayerId::ONE), destroyed(PlayerId::TWO)) {
        (true, true) => return Some((Outcome::Draw, VictoryReason::MutualDestruction)),
        (true, false) => {
            return Some((Outcome::Winner(PlayerId::TWO), VictoryReason::BaseDestroyed));
        }
        (false, true) => {
            return Some((Outcome::Winner(PlayerId::ONE), VictoryReason::BaseDestroyed));
        }
        (false, false) => {}
    }

    if let Some(loser) = state.surrendered() {
        return Some((Outcome::Winner(loser.opponent()), VictoryReason::Surrender));
    }

    if state.draw_agreed() {
        return Some((Outcome::Draw, VictoryReason::AgreedDraw));
    }

    if let Some(loser) = eliminated_player(state) {
        return Some((Outcome::Winner(loser.opponent()), VictoryReason::Elimination));
    }

    if is_stalemate(state) {
        return Some((Outcome::Draw, VictoryReason::Stalemate));
    }

    None
}

/// The single player who is out of units and cannot rebuild, if exactly one is.
#[must_use]
pub fn eliminated_player(state: &GameState) -> Option<PlayerId> {
    if state.turn_number() < state.config().elimination_min_turn {
        return None;
    }
    let cheapest = UnitKind::cheapest_cost();
    let mut out = PlayerId::ALL.into_iter().filter(|&seat| {
        state.player(seat).is_some_and(|player| {
            player.units.is_empty() && !player.can_afford(cheapest)
        })
    });
    match (out.next(), out.next()) {
        (Some(player), None) => Some(player),
        _ => None,
    }
}

/// Whether neither player has any move, attack or build available.
///
/// Capability is judged over a full turn (full unit allowances, any phase),
/// so a player who has merely spent this turn's actions is not stuck.
#[must_use]
pub fn is_stalemate(state: &GameState) -> bool {
    !PlayerId::ALL.into_iter().any(|seat| has_any_option(state, seat))
}

/// Whether `player` could move, attack or build on some turn from here.
#[must_use]
pub fn has_any_option(state: &GameState, player: PlayerId) -> bool {
    let board = state.board();
    let units_can_act = state.units_of(player).any(|unit| {
        movement::reachable(board, unit.position, unit.max_actions())
            .next()
            .is_some()
            || unit.position.neighbors8().into_iter().any(|cell| {
                state
                    .owner_at(cell)
                    .is_some_and(|owner| owner != player)
            })
    });
    units_can_act || production::can_build_anything(state, player)
}

/// Run arbitration, record the result and emit events.
///
/// Emits `victoryCheck`, then `stalemateDetected` and `gameEnded` as needed.
/// Returns the outcome, which stays `Unresolved` while play continues.
pub(crate) fn arbitrate(state: &mut GameState, events: &mut Vec<GameEvent>) -> Outcome {
    let verdict = evaluate(state);
    let outcome = verdict.map_or(Outcome::Unresolved, |(outcome, _)| outcome);
    events.push(GameEvent::VictoryCheck { outcome });

    if let Some((outcome, reason)) = verdict {
        if reason == VictoryReason::Stalemate {
            events.push(GameEvent::StalemateDetected);
        }
        state.set_outcome(outcome, reason);
        info!(
            game = state.game_id(),
            ?outcome,
            ?reason,
            turn = state.turn_number(),
            "Game ended"
        );
        events.push(GameEvent::GameEnded { outcome, reason });
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::entities::{BaseId, EntityRef};
    use crate::grid::Position;
    use crate::turn::GameStatus;

    fn playing(config: GameConfig) -> GameState {
        let mut state = GameState::new("victory", config).unwrap();
        state.set_status(GameStatus::Playing);
        state
    }

    #[test]
    fn test_fresh_game_is_unresolved() {
        let state = playing(GameConfig::default());
        assert_eq!(evaluate(&state), None);
    }

    #[test]
    fn test_base_destruction_beats_surrender() {
        let mut state = playing(GameConfig::default());
        state.record_surrender(PlayerId::TWO);
        state.apply_damage(EntityRef::Base(BaseId::new(2)), 1000);
        state.record_surrender(PlayerId::ONE);
        assert_eq!(
            evaluate(&state),
            Some((Outcome::Winner(PlayerId::ONE), VictoryReason::BaseDestroyed))
        );

        state.apply_damage(EntityRef::Base(BaseId::new(1)), 1000);
        assert_eq!(
            evaluate(&state),
            Some((Outcome::Draw, VictoryReason::MutualDestruction))
        );
    }

    #[test]
    fn test_surrender_beats_agreed_draw() {
        let mut state = playing(GameConfig::default());
        state.record_draw_agreement();
        state.record_surrender(PlayerId::ONE);
        assert_eq!(
            evaluate(&state),
            Some((Outcome::Winner(PlayerId::TWO), VictoryReason::Surrender))
        );
    }

    #[test]
    fn test_elimination_requires_min_turn_and_poverty() {
        let config = GameConfig {
            elimination_min_turn: 3,
            ..GameConfig::default()
        };
        let mut state = playing(config);
        state.spawn_unit(UnitKind::Worker, PlayerId::ONE, Position::new(6, 6)).unwrap();
        state.player_mut(PlayerId::TWO).unwrap().energy = 1;

        assert_eq!(eliminated_player(&state), None, "too early");

        state.set_turn(PlayerId::ONE, crate::turn::Phase::Resource, 3);
        assert_eq!(eliminated_player(&state), Some(PlayerId::TWO));
        assert_eq!(
            evaluate(&state),
            Some((Outcome::Winner(PlayerId::ONE), VictoryReason::Elimination))
        );

        state.player_mut(PlayerId::TWO).unwrap().energy = 2;
        assert_eq!(eliminated_player(&state), None, "can still rebuild");
    }

    #[test]
    fn test_stalemate_when_nobody_can_act() {
        let config = GameConfig {
            starting_energy: 0,
            elimination_min_turn: 1000,
            ..GameConfig::default()
        };
        let state = playing(config);
        assert!(is_stalemate(&state));
        assert_eq!(evaluate(&state), Some((Outcome::Draw, VictoryReason::Stalemate)));
    }

    #[test]
    fn test_arbitrate_ends_game_once() {
        let mut state = playing(GameConfig::default());
        state.record_surrender(PlayerId::ONE);
        let mut events = Vec::new();
        let outcome = arbitrate(&mut state, &mut events);

        assert_eq!(outcome, Outcome::Winner(PlayerId::TWO));
        assert_eq!(state.status(), GameStatus::Ended);
        assert_eq!(state.victory_reason(), Some(VictoryReason::Surrender));
        let ended = events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }
}
