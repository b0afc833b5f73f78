//! Test fixtures and helpers.
//!
//! Pre-built engines for consistent testing. Everything here goes through
//! the public command surface, so a fixture can never produce a state the
//! engine itself could not reach.

use skirmish_core::prelude::*;
use tracing::debug;

/// Game id used by fixtures.
pub const FIXTURE_GAME_ID: &str = "fixture";

/// Default rules with a spawn range covering the whole board and enough
/// energy to build anything, so units can be placed where a test needs them.
#[must_use]
pub fn arena_config() -> GameConfig {
    GameConfig {
        spawn_range: 24,
        starting_energy: 200,
        ..GameConfig::default()
    }
}

/// A started game on the default rules, at P1's resource phase of turn 1.
///
/// # Panics
///
/// Panics if the default config is rejected.
#[must_use]
pub fn started_engine() -> Engine {
    let mut engine = Engine::new(FIXTURE_GAME_ID, GameConfig::default()).expect("default config");
    engine.start_game().expect("fresh game starts");
    engine
}

/// Advance phases until `player` holds `phase`.
///
/// # Panics
///
/// Panics if the game ends or the position is not reached within one round.
pub fn advance_to(engine: &mut Engine, player: PlayerId, phase: Phase) {
    for _ in 0..=6 {
        let state = engine.state();
        if state.current_player() == player && state.phase() == phase {
            return;
        }
        engine.advance_phase().expect("phase advances");
    }
    panic!("could not reach {phase} for player {player}");
}

/// Start a game on `config` and build `units` for their owners, finishing at
/// P1's resource phase of turn 2.
///
/// Returns the new ids in the order given. Listing a unit for a seat spends
/// that seat's energy like any other build.
///
/// # Panics
///
/// Panics if the config is invalid or any build is rejected.
#[must_use]
pub fn engine_with_units(
    config: GameConfig,
    units: &[(UnitKind, PlayerId, Position)],
) -> (Engine, Vec<UnitId>) {
    let mut engine = Engine::new(FIXTURE_GAME_ID, config).expect("valid config");
    engine.start_game().expect("fresh game starts");

    let mut ids = vec![None; units.len()];
    for seat in [PlayerId::ONE, PlayerId::TWO] {
        advance_to(&mut engine, seat, Phase::Build);
        for (slot, &(kind, owner, at)) in ids.iter_mut().zip(units) {
            if owner == seat {
                let id = engine
                    .create_unit(kind, owner, at)
                    .unwrap_or_else(|rejection| panic!("cannot build {kind} at {at}: {rejection}"));
                debug!(unit = %id, %kind, %at, "Fixture unit placed");
                *slot = Some(id);
            }
        }
    }
    advance_to(&mut engine, PlayerId::ONE, Phase::Resource);

    let ids = ids
        .into_iter()
        .map(|id| id.expect("every unit belongs to a seat"))
        .collect();
    (engine, ids)
}

/// Shorthand for [`engine_with_units`] on [`arena_config`].
#[must_use]
pub fn arena_with_units(units: &[(UnitKind, PlayerId, Position)]) -> (Engine, Vec<UnitId>) {
    engine_with_units(arena_config(), units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_engine_is_at_first_resource_phase() {
        let engine = started_engine();
        assert_eq!(engine.state().status(), GameStatus::Playing);
        assert_eq!(engine.state().current_player(), PlayerId::ONE);
        assert_eq!(engine.state().phase(), Phase::Resource);
        assert_eq!(engine.state().turn_number(), 1);
    }

    #[test]
    fn test_arena_places_units_for_both_seats() {
        let (engine, ids) = arena_with_units(&[
            (UnitKind::Infantry, PlayerId::ONE, Position::new(10, 10)),
            (UnitKind::Worker, PlayerId::TWO, Position::new(11, 10)),
        ]);
        assert_eq!(ids.len(), 2);
        assert_eq!(engine.unit_at(Position::new(10, 10)).map(|u| u.id), Some(ids[0]));
        assert_eq!(engine.unit_at(Position::new(11, 10)).map(|u| u.owner), Some(PlayerId::TWO));
        assert_eq!(engine.state().turn_number(), 2);
        engine.state().check_invariants().unwrap();
    }

    #[test]
    fn test_advance_to_stops_immediately_when_already_there() {
        let mut engine = started_engine();
        advance_to(&mut engine, PlayerId::ONE, Phase::Resource);
        assert_eq!(engine.state().phase(), Phase::Resource);
        advance_to(&mut engine, PlayerId::TWO, Phase::Action);
        assert_eq!(engine.state().current_player(), PlayerId::TWO);
        assert_eq!(engine.state().phase(), Phase::Action);
    }
}
