//! # Skirmish Core
//!
//! Deterministic rules engine for a two-player, turn-based grid skirmish.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No networking
//! - No randomness
//! - No IO beyond loading configs, snapshots and replays
//!
//! Every command is validated in full before anything changes, so a rejected
//! command leaves the game untouched. The same command sequence from the same
//! state always yields the same state, which is what replays and
//! [`Engine::state_hash`](engine::Engine::state_hash) rely on.
//!
//! ## Crate Structure
//!
//! - [`engine`] - Command entry point, batching and event dispatch
//! - [`game`] - Authoritative game state
//! - [`turn`] - Phase cycle and turn bookkeeping
//! - [`movement`], [`combat`], [`economy`], [`production`] - Rule subsystems
//! - [`victory`] - End-of-game arbitration
//! - [`snapshot`], [`replay`] - Persistence
//! - [`facade`] - Seat-bound player interface

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod board;
pub mod combat;
pub mod config;
pub mod economy;
pub mod engine;
pub mod entities;
pub mod error;
pub mod events;
pub mod facade;
pub mod game;
pub mod grid;
pub mod movement;
pub mod production;
pub mod replay;
pub mod snapshot;
pub mod turn;
pub mod units;
pub mod victory;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::board::Board;
    pub use crate::combat::AttackReport;
    pub use crate::config::{GameConfig, NodeConfig};
    pub use crate::economy::GatherReport;
    pub use crate::engine::{Command, CommandOutcome, Engine};
    pub use crate::entities::{
        Base, BaseId, EntityRef, Health, NodeId, Player, PlayerId, ResourceNode, Unit, UnitId,
    };
    pub use crate::error::{CommandResult, GameError, Rejection, Result};
    pub use crate::events::{EventKind, GameEvent, SubscriptionId};
    pub use crate::facade::{PlayerFacade, SeatHandle, UnitInfo};
    pub use crate::game::GameState;
    pub use crate::grid::Position;
    pub use crate::movement::MoveOption;
    pub use crate::replay::{Replay, ReplayEntry, ReplayPlayer};
    pub use crate::snapshot::Snapshot;
    pub use crate::turn::{GameStatus, Phase, TurnPosition};
    pub use crate::units::{UnitKind, UnitStats};
    pub use crate::victory::{Outcome, VictoryReason};
}
