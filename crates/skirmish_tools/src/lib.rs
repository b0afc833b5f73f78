//! # Skirmish Development Tools
//!
//! Command-line tools for development:
//! - Config and snapshot validators
//! - Replay verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;
