//! # Skirmish Test Utilities
//!
//! Shared testing utilities for the workspace:
//! - Determinism test harness
//! - Engine fixtures with units already on the board
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

pub use determinism::strategies;

/// Re-export proptest for convenience.
pub use proptest;
