//! Rules benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use skirmish_core::movement;
use skirmish_core::prelude::*;
use skirmish_core::victory;

/// Engine in P1's build phase with a handful of units on both sides.
fn crowded_engine() -> Engine {
    let mut engine = Engine::new("bench", GameConfig::default()).expect("default config");
    engine.start_game().expect("start");
    for _ in 0..2 {
        engine.advance_phase().expect("advance");
    }
    for (kind, at) in [
        (UnitKind::Scout, Position::new(6, 6)),
        (UnitKind::Infantry, Position::new(4, 4)),
        (UnitKind::Worker, Position::new(6, 4)),
    ] {
        engine.create_unit(kind, PlayerId::ONE, at).expect("create");
    }
    engine
}

/// The crowded engine moved on to P1's action phase of turn 2.
fn action_phase_engine() -> Engine {
    let mut engine = crowded_engine();
    for _ in 0..4 {
        engine.advance_phase().expect("advance");
    }
    assert_eq!(engine.state().phase(), Phase::Action);
    assert_eq!(engine.state().current_player(), PlayerId::ONE);
    engine
}

pub fn movement_benchmark(c: &mut Criterion) {
    let engine = action_phase_engine();
    let scout = engine.player_units(PlayerId::ONE)[0].id;
    assert!(!engine.valid_move_positions(scout).is_empty());

    c.bench_function("reachable_radius_4", |b| {
        b.iter(|| {
            movement::reachable(engine.state().board(), black_box(Position::new(12, 12)), 4).count()
        });
    });
    c.bench_function("valid_move_positions", |b| {
        b.iter(|| engine.valid_move_positions(black_box(scout)).len());
    });
}

pub fn victory_benchmark(c: &mut Criterion) {
    let engine = crowded_engine();

    c.bench_function("is_stalemate", |b| {
        b.iter(|| victory::is_stalemate(black_box(engine.state())));
    });
    c.bench_function("state_hash", |b| {
        b.iter(|| black_box(engine.state_hash()));
    });
}

pub fn turn_cycle_benchmark(c: &mut Criterion) {
    c.bench_function("full_round_of_phases", |b| {
        b.iter_batched(
            crowded_engine,
            |mut engine| {
                for _ in 0..6 {
                    let _ = engine.advance_phase();
                }
                engine
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, movement_benchmark, victory_benchmark, turn_cycle_benchmark);
criterion_main!(benches);
