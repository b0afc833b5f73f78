//! Turn and phase state machine.
//!
//! Each player's turn runs `resource → action → build`, then control passes
//! to the opponent. The turn number increments when play wraps back to
//! player 1. Transitions only happen through [`advance`]; there is no timer.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::economy;
use crate::entities::PlayerId;
use crate::events::GameEvent;
use crate::game::GameState;

/// Phase within a player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Income, regeneration and gathering.
    Resource,
    /// Movement and combat.
    Action,
    /// Unit creation.
    Build,
}

impl Phase {
    /// The phase that follows this one, and whether control passes to the
    /// other player on the way.
    #[must_use]
    pub const fn next(self) -> (Self, bool) {
        match self {
            Self::Resource => (Self::Action, false),
            Self::Action => (Self::Build, false),
            Self::Build => (Self::Resource, true),
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Action => "action",
            Self::Build => "build",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Created but not started. Only `start_game` is accepted.
    Ready,
    /// In progress.
    Playing,
    /// Finished. Only queries are accepted.
    Ended,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Ended => "ended",
        })
    }
}

/// Where the game stands after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPosition {
    /// Player whose turn it is.
    pub player: PlayerId,
    /// Current phase.
    pub phase: Phase,
    /// Current turn number.
    pub turn: u32,
}

/// Move the game from `ready` to `playing` and open player 1's first turn.
pub(crate) fn start(state: &mut GameState, events: &mut Vec<GameEvent>) -> TurnPosition {
    state.set_status(GameStatus::Playing);
    state.set_turn(PlayerId::ONE, Phase::Resource, 1);
    events.push(GameEvent::GameStarted {
        first_player: PlayerId::ONE,
    });
    begin_turn(state, PlayerId::ONE, events);
    state.turn_position()
}

/// Advance one phase. Returns the new position and whether control passed
/// to the other player.
pub(crate) fn advance(state: &mut GameState, events: &mut Vec<GameEvent>) -> (TurnPosition, bool) {
    let (phase, hand_off) = state.phase().next();
    if hand_off {
        let next = state.current_player().opponent();
        let turn = if next == PlayerId::ONE {
            state.turn_number() + 1
        } else {
            state.turn_number()
        };
        state.set_turn(next, phase, turn);
        begin_turn(state, next, events);
    } else {
        state.set_turn(state.current_player(), phase, state.turn_number());
        events.push(GameEvent::PhaseChanged {
            player: state.current_player(),
            phase,
            turn: state.turn_number(),
        });
    }
    (state.turn_position(), hand_off)
}

/// Enter the resource phase for `player`: refill budgets, then run the
/// economy's start-of-turn step.
fn begin_turn(state: &mut GameState, player: PlayerId, events: &mut Vec<GameEvent>) {
    let budget = state.config().actions_per_turn;
    if let Some(p) = state.player_mut(player) {
        p.actions_remaining = budget;
    }
    state.reset_unit_actions(player);
    economy::start_of_turn(state, player);
    debug!(player = %player, turn = state.turn_number(), "Turn started");
    events.push(GameEvent::PhaseChanged {
        player,
        phase: Phase::Resource,
        turn: state.turn_number(),
    });
}
