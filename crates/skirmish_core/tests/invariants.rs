//! Property tests: random command streams must never break the state.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use skirmish_core::prelude::*;
use skirmish_test_utils::determinism::verify_snapshot_determinism;
use skirmish_test_utils::fixtures::arena_with_units;
use skirmish_test_utils::strategies::{arb_command, arb_command_sequence};

/// Two small armies facing each other across the middle of the board.
fn skirmish() -> Engine {
    arena_with_units(&[
        (UnitKind::Worker, PlayerId::ONE, Position::new(11, 12)),
        (UnitKind::Infantry, PlayerId::ONE, Position::new(11, 11)),
        (UnitKind::Scout, PlayerId::ONE, Position::new(10, 12)),
        (UnitKind::Siege, PlayerId::TWO, Position::new(13, 13)),
        (UnitKind::Infantry, PlayerId::TWO, Position::new(12, 13)),
        (UnitKind::Worker, PlayerId::TWO, Position::new(13, 12)),
    ])
    .0
}

fn assert_consistent(engine: &Engine) -> std::result::Result<(), TestCaseError> {
    let state = engine.state();
    prop_assert!(state.check_invariants().is_ok(), "{:?}", state.check_invariants());

    let standing_bases = state.bases().filter(|base| !base.destroyed).count();
    prop_assert_eq!(state.board().occupied_count(), state.units().count() + standing_bases);

    for unit in state.units() {
        prop_assert!(unit.health.current > 0);
        prop_assert!(unit.actions_used <= unit.max_actions());
    }
    for player in state.players() {
        prop_assert!(player.actions_remaining <= state.config().actions_per_turn);
    }
    for node in state.nodes() {
        prop_assert!(node.value <= node.max_value);
    }
    Ok(())
}

fn assert_outcome_exclusive(engine: &Engine) -> std::result::Result<(), TestCaseError> {
    let state = engine.state();
    match state.outcome() {
        Outcome::Unresolved => {
            prop_assert_ne!(state.status(), GameStatus::Ended);
            prop_assert!(state.victory_reason().is_none());
        }
        Outcome::Winner(player) => {
            prop_assert!(player.is_seat());
            prop_assert_eq!(state.status(), GameStatus::Ended);
            prop_assert!(state.victory_reason().is_some());
        }
        Outcome::Draw => {
            prop_assert_eq!(state.status(), GameStatus::Ended);
            prop_assert!(state.victory_reason().is_some());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_state_stays_consistent(commands in arb_command_sequence(60)) {
        let mut engine = skirmish();
        for command in commands {
            let _ = engine.apply(command);
            assert_consistent(&engine)?;
            assert_outcome_exclusive(&engine)?;
        }
    }

    #[test]
    fn prop_rejections_leave_state_untouched(commands in arb_command_sequence(40)) {
        let mut engine = skirmish();
        for command in commands {
            let before = engine.state().clone();
            if engine.apply(command).is_err() {
                prop_assert_eq!(engine.state(), &before);
            }
        }
    }

    #[test]
    fn prop_moves_cost_manhattan_distance(commands in arb_command_sequence(60)) {
        let mut engine = skirmish();
        for command in commands {
            let before = engine.state().clone();
            if let (Command::MoveUnit { unit, to }, Ok(CommandOutcome::Moved { cost, .. })) =
                (command, engine.apply(command))
            {
                let mover = before.unit(unit).unwrap();
                prop_assert_eq!(cost, mover.position.manhattan_distance(to));
                prop_assert!(cost >= 1 && cost <= mover.remaining_actions());
                prop_assert_eq!(before.board().get(to), None);
                prop_assert_eq!(engine.unit_at(to).map(|u| u.id), Some(unit));
            }
        }
    }

    #[test]
    fn prop_attacks_hit_adjacent_enemies(commands in arb_command_sequence(60)) {
        let mut engine = skirmish();
        for command in commands {
            let before = engine.state().clone();
            if let (Command::AttackUnit { unit, target }, Ok(CommandOutcome::Attacked(report))) =
                (command, engine.apply(command))
            {
                let attacker = before.unit(unit).unwrap();
                prop_assert_eq!(attacker.position.chebyshev_distance(target), 1);
                prop_assert_ne!(before.owner_at(target), Some(attacker.owner));
                prop_assert_eq!(report.damage, attacker.kind.stats().damage);
            }
        }
    }

    #[test]
    fn prop_snapshot_round_trip(commands in arb_command_sequence(40)) {
        let mut engine = skirmish();
        for command in commands {
            let _ = engine.apply(command);
        }
        prop_assert!(verify_snapshot_determinism(&engine));
    }

    #[test]
    fn prop_game_ends_at_most_once(commands in proptest::collection::vec(arb_command(12), 0..80)) {
        let mut engine = skirmish();
        let ended = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&ended);
        engine.subscribe(EventKind::GameEnded, move |_| *sink.borrow_mut() += 1);

        for chunk in commands.chunks(4) {
            let _ = engine.apply_batch(chunk);
            assert_outcome_exclusive(&engine)?;
        }
        let expected = usize::from(engine.outcome().is_resolved());
        prop_assert_eq!(*ended.borrow(), expected);
    }
}
