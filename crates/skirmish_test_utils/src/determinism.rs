//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the engine produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and state hashes are only meaningful if the engine is 100%
//! deterministic. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The engine keeps every collection in a `BTreeMap` or `Vec`.
//!
//! - **System randomness**: The rules contain none, and must stay that way.
//!
//! - **Listener side effects**: Subscribers only ever see `&GameEvent`, so
//!   they cannot feed back into the state.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rule modules (movement, combat, etc.)
//! 2. **Property tests**: Random command streams must still replay exactly
//! 3. **Integration tests**: Full games are reproducible from a snapshot

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use skirmish_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: usize,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs agreed, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Engine is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step, given its index
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: usize,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, usize),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for index in 0..steps {
            step(&mut state, index);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Apply `commands` to two engines built by `setup` and compare final hashes.
///
/// Rejected commands are part of the stream; they must be rejected the same
/// way on both runs.
pub fn verify_engine_determinism<F>(setup: F, commands: &[Command]) -> bool
where
    F: Fn() -> Engine,
{
    verify_determinism(
        2,
        commands.len(),
        &setup,
        |engine, index| {
            let _ = engine.apply(commands[index]);
        },
        Engine::state_hash,
    )
    .is_deterministic
}

/// Compare two runs command by command, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(n)` if they first differ after
/// `n` commands (`0` meaning the setups already differ).
pub fn find_first_divergence<F>(setup: F, commands: &[Command]) -> Option<usize>
where
    F: Fn() -> Engine,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for (index, &command) in commands.iter().enumerate() {
        let a = first.apply(command);
        let b = second.apply(command);
        if a != b || first.state_hash() != second.state_hash() {
            return Some(index + 1);
        }
    }

    None
}

/// Verify that a snapshot round trip preserves the state exactly.
pub fn verify_snapshot_determinism(engine: &Engine) -> bool {
    let Ok(json) = engine.to_json() else {
        return false;
    };
    let Ok(restored) = Engine::from_json(&json) else {
        return false;
    };
    restored.state() == engine.state() && restored.state_hash() == engine.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for engine testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the rules.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::prelude::*;

    /// Generate a coordinate pair, including a margin outside a 25x25 board.
    pub fn arb_position() -> impl Strategy<Value = Position> {
        (-2i32..27, -2i32..27).prop_map(|(x, y)| Position::new(x, y))
    }

    /// Generate a cell close to `center`, where most interesting play happens.
    pub fn arb_position_near(center: Position, radius: i32) -> impl Strategy<Value = Position> {
        (-radius..=radius, -radius..=radius).prop_map(move |(dx, dy)| center.offset(dx, dy))
    }

    /// Generate any unit kind.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::Worker),
            Just(UnitKind::Infantry),
            Just(UnitKind::Scout),
            Just(UnitKind::Siege),
        ]
    }

    /// Generate a seat.
    pub fn arb_player() -> impl Strategy<Value = PlayerId> {
        prop_oneof![Just(PlayerId::ONE), Just(PlayerId::TWO)]
    }

    /// Generate a unit id up to `max_id`, which may or may not exist.
    pub fn arb_unit_id(max_id: u32) -> impl Strategy<Value = UnitId> {
        (1..=max_id.max(1)).prop_map(UnitId::new)
    }

    /// Generate any command except the game-ending ones.
    ///
    /// Phase advances are weighted up so that streams actually visit every
    /// phase of both seats.
    pub fn arb_playing_command(max_unit_id: u32) -> impl Strategy<Value = Command> {
        prop_oneof![
            3 => Just(Command::AdvancePhase),
            2 => (arb_unit_kind(), arb_player(), arb_position())
                .prop_map(|(kind, player, at)| Command::CreateUnit { kind, player, at }),
            2 => (arb_unit_id(max_unit_id), arb_position())
                .prop_map(|(unit, to)| Command::MoveUnit { unit, to }),
            2 => (arb_unit_id(max_unit_id), arb_position())
                .prop_map(|(unit, target)| Command::AttackUnit { unit, target }),
            1 => arb_unit_id(max_unit_id).prop_map(|unit| Command::GatherResource { unit }),
        ]
    }

    /// Generate any command, surrender and draw included.
    pub fn arb_command(max_unit_id: u32) -> impl Strategy<Value = Command> {
        prop_oneof![
            20 => arb_playing_command(max_unit_id),
            1 => arb_player().prop_map(|player| Command::Surrender { player }),
            1 => Just(Command::DeclareDraw),
            1 => Just(Command::StartGame),
        ]
    }

    /// Generate a sequence of commands that keeps the game running.
    pub fn arb_command_sequence(max_len: usize) -> impl Strategy<Value = Vec<Command>> {
        proptest::collection::vec(arb_playing_command(12), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{arena_with_units, started_engine};
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n, _| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_empty_game_determinism() {
        let commands = [Command::AdvancePhase; 12];
        assert!(verify_engine_determinism(started_engine, &commands));
    }

    #[test]
    fn test_skirmish_determinism() {
        let setup = || {
            arena_with_units(&[
                (UnitKind::Infantry, PlayerId::ONE, Position::new(10, 10)),
                (UnitKind::Worker, PlayerId::TWO, Position::new(11, 10)),
            ])
            .0
        };
        let commands = [
            Command::AdvancePhase,
            Command::AttackUnit {
                unit: UnitId::new(1),
                target: Position::new(11, 10),
            },
            Command::MoveUnit {
                unit: UnitId::new(1),
                to: Position::new(10, 11),
            },
            Command::AdvancePhase,
            Command::AdvancePhase,
        ];
        assert!(verify_engine_determinism(setup, &commands));
        assert_eq!(find_first_divergence(setup, &commands), None);
    }

    #[test]
    fn test_snapshot_determinism() {
        let (engine, _) = arena_with_units(&[
            (UnitKind::Scout, PlayerId::ONE, Position::new(3, 3)),
            (UnitKind::Siege, PlayerId::TWO, Position::new(20, 20)),
        ]);
        assert!(verify_snapshot_determinism(&engine));
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_random_streams_are_deterministic(commands in strategies::arb_command_sequence(40)) {
            prop_assert!(verify_engine_determinism(started_engine, &commands));
        }
    }
}
