//! Match configuration.
//!
//! Configs are plain data that can be written in RON and loaded with
//! [`GameConfig::load`]. Missing fields fall back to the defaults of the
//! standard 25×25 map.
//!
//! # Example RON
//!
//! ```ron
//! GameConfig(
//!     width: 15,
//!     height: 15,
//!     base_positions: ((x: 2, y: 2), (x: 12, y: 12)),
//!     elimination_min_turn: 5,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::Position;

/// Placement and tuning of one resource node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Cell the node sits on.
    pub position: Position,
    /// Starting value.
    pub value: u32,
    /// Value cap.
    pub max_value: u32,
    /// Amount restored every resource phase.
    pub regen_rate: u32,
}

/// Rules and map layout for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board columns.
    pub width: u32,
    /// Board rows.
    pub height: u32,
    /// Display names for seat 1 and seat 2.
    pub player_names: [String; 2],
    /// Starting base cells for seat 1 and seat 2.
    pub base_positions: [Position; 2],
    /// Health of each base.
    pub base_health: u32,
    /// Energy each player starts with.
    pub starting_energy: u32,
    /// Player action budget per turn.
    pub actions_per_turn: u32,
    /// Energy granted at the start of each of a player's turns.
    pub passive_income: u32,
    /// Energy moved from a node per gather.
    pub gather_amount: u32,
    /// Own turns a unit waits before gathering the same node again.
    pub gather_cooldown_turns: u32,
    /// First turn on which elimination can end the game.
    pub elimination_min_turn: u32,
    /// Maximum Chebyshev distance between a new unit and its base.
    pub spawn_range: u32,
    /// Resource nodes on the map.
    pub resource_nodes: Vec<NodeConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 25,
            height: 25,
            player_names: ["Red".to_string(), "Blue".to_string()],
            base_positions: [Position::new(5, 5), Position::new(19, 19)],
            base_health: 20,
            starting_energy: 10,
            actions_per_turn: 10,
            passive_income: 1,
            gather_amount: 2,
            gather_cooldown_turns: 1,
            elimination_min_turn: 10,
            spawn_range: 1,
            resource_nodes: vec![
                NodeConfig {
                    position: Position::new(12, 12),
                    value: 10,
                    max_value: 10,
                    regen_rate: 1,
                },
                NodeConfig {
                    position: Position::new(8, 16),
                    value: 6,
                    max_value: 6,
                    regen_rate: 1,
                },
                NodeConfig {
                    position: Position::new(16, 8),
                    value: 6,
                    max_value: 6,
                    regen_rate: 1,
                },
            ],
        }
    }
}

impl GameConfig {
    /// Parse a config from RON text and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] for malformed RON and
    /// [`GameError::InvalidConfig`] when validation fails.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = ron::from_str(&text).map_err(|e| GameError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render this config as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Check the config describes a playable match.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidConfig(format!(
                "board must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        for (seat, pos) in self.base_positions.iter().enumerate() {
            if !self.in_bounds(*pos) {
                return Err(GameError::InvalidConfig(format!(
                    "base of player {} at {pos} is off the board",
                    seat + 1
                )));
            }
        }
        if self.base_positions[0] == self.base_positions[1] {
            return Err(GameError::InvalidConfig("both bases share one cell".to_string()));
        }
        if self.spawn_range > self.width.max(self.height) {
            return Err(GameError::InvalidConfig(format!(
                "spawn_range {} exceeds the {}x{} board",
                self.spawn_range, self.width, self.height
            )));
        }
        if self.base_health == 0 {
            return Err(GameError::InvalidConfig("base_health must be positive".to_string()));
        }
        for node in &self.resource_nodes {
            if !self.in_bounds(node.position) {
                return Err(GameError::InvalidConfig(format!(
                    "resource node at {} is off the board",
                    node.position
                )));
            }
            if node.value > node.max_value {
                return Err(GameError::InvalidConfig(format!(
                    "resource node at {} starts above its maximum",
                    node.position
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_positions[0], Position::new(5, 5));
        assert_eq!(config.base_positions[1], Position::new(19, 19));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = GameConfig::from_ron_str(
            "(width: 15, height: 12, \
             base_positions: ((x: 1, y: 1), (x: 13, y: 10)), resource_nodes: [])",
        )
        .unwrap();
        assert_eq!(config.width, 15);
        assert_eq!(config.height, 12);
        assert_eq!(config.base_health, GameConfig::default().base_health);
        assert!(config.resource_nodes.is_empty());
    }

    #[test]
    fn test_ron_round_trip() {
        let config = GameConfig::default();
        let text = config.to_ron_string().unwrap();
        assert_eq!(GameConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_off_board_base() {
        let config = GameConfig {
            width: 10,
            height: 10,
            resource_nodes: Vec::new(),
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_shared_base_cell() {
        let config = GameConfig {
            base_positions: [Position::new(3, 3), Position::new(3, 3)],
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        assert!(matches!(
            GameConfig::from_ron_str("(width: )"),
            Err(GameError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.ron");
        std::fs::write(&path, "(elimination_min_turn: 3)").unwrap();

        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.elimination_min_turn, 3);
    }

    #[test]
    fn test_rejects_spawn_range_beyond_board() {
        let config = GameConfig {
            spawn_range: 20_000,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let config = GameConfig {
            spawn_range: 25,
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
