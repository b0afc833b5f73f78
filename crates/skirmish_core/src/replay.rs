//! Replay system for recording and playing back games.
//!
//! A replay stores the snapshot a game started from and every command issued
//! afterwards. Because the engine is deterministic, re-applying the commands
//! to the restored snapshot reproduces the game exactly, which
//! [`ReplayPlayer::verify`] checks against the recorded final hash.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{Command, CommandOutcome, Engine};
use crate::error::{CommandResult, GameError, Result};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// One recorded call into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// A command applied on its own.
    Single(Command),
    /// Commands applied together with [`Engine::apply_batch`].
    Batch(Vec<Command>),
}

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Game identifier.
    pub game_id: String,
    /// Snapshot JSON of the starting state.
    pub initial_snapshot: String,
    /// Recorded engine calls, in order.
    pub entries: Vec<ReplayEntry>,
    /// Turn number when recording stopped.
    pub final_turn: u32,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay from the engine's current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized.
    pub fn new(engine: &Engine) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            game_id: engine.state().game_id().to_string(),
            initial_snapshot: engine.to_json()?,
            entries: Vec::new(),
            final_turn: engine.state().turn_number(),
            final_hash: engine.state_hash(),
        })
    }

    /// Record a single command.
    pub fn record(&mut self, command: Command) {
        self.entries.push(ReplayEntry::Single(command));
    }

    /// Record a batch.
    pub fn record_batch(&mut self, commands: &[Command]) {
        self.entries.push(ReplayEntry::Batch(commands.to_vec()));
    }

    /// Stamp the replay with the engine's end state.
    pub fn finalize(&mut self, engine: &Engine) {
        self.final_turn = engine.state().turn_number();
        self.final_hash = engine.state_hash();
    }

    /// Total number of recorded commands, batch members included.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                ReplayEntry::Single(_) => 1,
                ReplayEntry::Batch(commands) => commands.len(),
            })
            .sum()
    }

    /// Restore an engine at the starting state.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot is invalid.
    pub fn restore_initial_state(&self) -> Result<Engine> {
        Engine::from_json(&self.initial_snapshot)
    }

    /// Encode with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize replay: {e}")))
    }

    /// Decode from bincode, checking the format version.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the version is unknown.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize replay: {e}")))?;
        if replay.version != REPLAY_VERSION {
            return Err(GameError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }
        Ok(replay)
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file reading or deserialization fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(&std::fs::read(path.as_ref())?)
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    engine: Engine,
    cursor: usize,
}

impl ReplayPlayer {
    /// Create a player positioned before the first entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let engine = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            engine,
            cursor: 0,
        })
    }

    /// Apply the next entry. Returns `None` once the replay is exhausted.
    ///
    /// Rejected commands are part of a faithful replay, so their results are
    /// returned rather than treated as errors.
    pub fn step(&mut self) -> Option<Vec<CommandResult<CommandOutcome>>> {
        let entry = self.replay.entries.get(self.cursor)?;
        let results = match entry {
            ReplayEntry::Single(command) => vec![self.engine.apply(*command)],
            ReplayEntry::Batch(commands) => self.engine.apply_batch(commands),
        };
        self.cursor += 1;
        Some(results)
    }

    /// Rewind and replay up to (not including) entry `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if state restoration fails.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        self.engine = self.replay.restore_initial_state()?;
        self.cursor = 0;
        while self.cursor < target && self.step().is_some() {}
        Ok(())
    }

    /// Index of the next entry.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// The engine at the current position.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether every entry has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.entries.len()
    }

    /// Replay everything from the start and compare the final hash.
    ///
    /// # Errors
    ///
    /// Returns an error if state restoration fails.
    pub fn verify(&mut self) -> Result<bool> {
        self.seek(self.replay.entries.len())?;
        let actual = self.engine.state_hash();
        debug!(expected = self.replay.final_hash, actual, "Replay verified");
        Ok(actual == self.replay.final_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::entities::PlayerId;
    use crate::grid::Position;
    use crate::units::UnitKind;

    fn recorded_game() -> Replay {
        let mut engine = Engine::new("replay", GameConfig::default()).unwrap();
        let mut replay = Replay::new(&engine).unwrap();

        let commands = [
            Command::StartGame,
            Command::AdvancePhase,
            Command::AdvancePhase,
            Command::CreateUnit {
                kind: UnitKind::Scout,
                player: PlayerId::ONE,
                at: Position::new(6, 5),
            },
            Command::AdvancePhase,
        ];
        for command in commands {
            let _ = engine.apply(command);
            replay.record(command);
        }
        let batch = [Command::AdvancePhase, Command::AdvancePhase];
        engine.apply_batch(&batch);
        replay.record_batch(&batch);

        replay.finalize(&engine);
        replay
    }

    #[test]
    fn test_replay_counts() {
        let replay = recorded_game();
        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.entries.len(), 6);
        assert_eq!(replay.command_count(), 7);
    }

    #[test]
    fn test_replay_verifies() {
        let mut player = ReplayPlayer::new(recorded_game()).unwrap();
        assert!(player.verify().unwrap());
        assert!(player.is_finished());
        assert_eq!(player.engine().player_units(PlayerId::ONE).len(), 1);
    }

    #[test]
    fn test_tampered_replay_fails_verification() {
        let mut replay = recorded_game();
        replay.entries.truncate(3);
        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(!player.verify().unwrap());
    }

    #[test]
    fn test_seek_rewinds() {
        let mut player = ReplayPlayer::new(recorded_game()).unwrap();
        player.seek(4).unwrap();
        assert_eq!(player.position(), 4);
        assert_eq!(player.engine().player_units(PlayerId::ONE).len(), 1);

        player.seek(1).unwrap();
        assert_eq!(player.position(), 1);
        assert!(player.engine().player_units(PlayerId::ONE).is_empty());
    }

    #[test]
    fn test_save_load() {
        let replay = recorded_game();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.replay");
        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded, replay);
    }

    #[test]
    fn test_version_mismatch() {
        let mut replay = recorded_game();
        replay.version = 99;
        let bytes = replay.to_bytes().unwrap();
        assert!(matches!(
            Replay::from_bytes(&bytes),
            Err(GameError::ReplayVersion { found: 99, .. })
        ));
    }
}
