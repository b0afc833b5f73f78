//! Data validation utilities.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use skirmish_core::prelude::*;

/// Validation failures.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The engine refused the file.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A replay did not reproduce its recorded end state.
    #[error("replay diverged: expected hash {expected:#018x}, got {actual:#018x}")]
    ReplayDiverged {
        /// Hash stored in the replay.
        expected: u64,
        /// Hash after re-running it.
        actual: u64,
    },
}

/// Result type for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// What a valid snapshot contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Game id.
    pub game_id: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Turn number.
    pub turn: u32,
    /// Live units.
    pub units: usize,
    /// Result so far.
    pub outcome: Outcome,
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "game '{}' {} at turn {} with {} units",
            self.game_id, self.status, self.turn, self.units
        )?;
        match self.outcome {
            Outcome::Unresolved => Ok(()),
            Outcome::Winner(player) => write!(f, ", won by player {player}"),
            Outcome::Draw => write!(f, ", drawn"),
        }
    }
}

/// What a verified replay contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Game id.
    pub game_id: String,
    /// Recorded entries.
    pub entries: usize,
    /// Recorded commands, batch members included.
    pub commands: usize,
    /// Turn at the end of the recording.
    pub final_turn: u32,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "game '{}', {} commands in {} entries, ends on turn {}",
            self.game_id, self.commands, self.entries, self.final_turn
        )
    }
}

/// Load and validate a RON config.
///
/// # Errors
///
/// Returns an error if the file is unreadable, malformed or unplayable.
pub fn validate_config(path: &Path) -> ToolResult<GameConfig> {
    debug!("Validating config {}", path.display());
    Ok(GameConfig::load(path)?)
}

/// Load a JSON snapshot and rebuild the game from it.
///
/// # Errors
///
/// Returns an error if the file is unreadable or the snapshot is
/// inconsistent, including any disagreement between board and entities.
pub fn validate_snapshot(path: &Path) -> ToolResult<SnapshotSummary> {
    debug!("Validating snapshot {}", path.display());
    let json = std::fs::read_to_string(path)?;
    let engine = Engine::from_json(&json)?;
    let state = engine.state();
    Ok(SnapshotSummary {
        game_id: state.game_id().to_string(),
        status: state.status(),
        turn: state.turn_number(),
        units: state.units().count(),
        outcome: state.outcome(),
    })
}

/// Re-run a replay file and check it reproduces its recorded end state.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the final hash differs.
pub fn verify_replay(path: &Path) -> ToolResult<ReplaySummary> {
    debug!("Verifying replay {}", path.display());
    let replay = Replay::load(path)?;
    let summary = ReplaySummary {
        game_id: replay.game_id.clone(),
        entries: replay.entries.len(),
        commands: replay.command_count(),
        final_turn: replay.final_turn,
    };
    let expected = replay.final_hash;

    let mut player = ReplayPlayer::new(replay)?;
    if !player.verify()? {
        return Err(ToolError::ReplayDiverged {
            expected,
            actual: player.engine().state_hash(),
        });
    }
    Ok(summary)
}

/// Validate every `.ron` config and `.json` snapshot in a directory.
///
/// Returns how many files were checked. Other files are ignored.
///
/// # Errors
///
/// Returns the first failure.
pub fn validate_directory(path: &Path) -> ToolResult<usize> {
    let mut files: Vec<_> = std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    files.sort();

    let mut checked = 0;
    for file in files {
        let outcome = match file.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => validate_config(&file).map(drop),
            Some("json") => validate_snapshot(&file).map(drop),
            _ => continue,
        };
        if let Err(e) = outcome {
            warn!("{} failed validation", file.display());
            return Err(e);
        }
        checked += 1;
    }
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_test_utils::fixtures::started_engine;

    #[test]
    fn test_validate_config_accepts_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.ron");
        std::fs::write(&path, GameConfig::default().to_ron_string().unwrap()).unwrap();

        let config = validate_config(&path).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_validate_config_rejects_overlapping_bases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ron");
        std::fs::write(&path, "(base_positions: ((x: 3, y: 3), (x: 3, y: 3)))").unwrap();

        assert!(matches!(
            validate_config(&path),
            Err(ToolError::Game(GameError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_validate_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, started_engine().to_json().unwrap()).unwrap();

        let summary = validate_snapshot(&path).unwrap();
        assert_eq!(summary.status, GameStatus::Playing);
        assert_eq!(summary.turn, 1);
        assert_eq!(summary.units, 0);
        assert_eq!(summary.outcome, Outcome::Unresolved);
    }

    #[test]
    fn test_validate_snapshot_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "{\"gameId\": 7}").unwrap();

        assert!(matches!(
            validate_snapshot(&path),
            Err(ToolError::Game(GameError::SnapshotParse(_)))
        ));
    }

    #[test]
    fn test_verify_replay() {
        let mut engine = started_engine();
        let mut replay = Replay::new(&engine).unwrap();
        for command in [Command::AdvancePhase, Command::AdvancePhase, Command::AdvancePhase] {
            let _ = engine.apply(command);
            replay.record(command);
        }
        replay.finalize(&engine);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.replay");
        replay.save(&path).unwrap();
        let summary = verify_replay(&path).unwrap();
        assert_eq!(summary.commands, 3);

        replay.final_hash ^= 1;
        replay.save(&path).unwrap();
        assert!(matches!(
            verify_replay(&path),
            Err(ToolError::ReplayDiverged { .. })
        ));
    }

    #[test]
    fn test_validate_directory_counts_known_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.ron"),
            GameConfig::default().to_ron_string().unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("b.json"), started_engine().to_json().unwrap()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(validate_directory(dir.path()).unwrap(), 2);
    }
}
