//! The fixed unit roster.
//!
//! Every unit kind is a variant of [`UnitKind`]; its stat block is looked up
//! with an exhaustive `match`, so adding a kind without stats fails to
//! compile rather than silently falling back to some default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stat block shared by every unit of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitStats {
    /// Health on creation.
    pub max_health: u32,
    /// Actions per turn (movement allowance and attack/gather budget).
    pub max_actions: u32,
    /// Energy cost to build.
    pub cost: u32,
    /// Damage dealt per attack, regardless of target.
    pub damage: u32,
}

/// Unit kinds available to both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Cheap gatherer. The only kind that can harvest resource nodes.
    Worker,
    /// Line combat unit.
    Infantry,
    /// Fragile, highly mobile unit.
    Scout,
    /// Slow, tough, hard-hitting unit.
    Siege,
}

impl UnitKind {
    /// Every kind, in roster order.
    pub const ALL: [Self; 4] = [Self::Worker, Self::Infantry, Self::Scout, Self::Siege];

    /// Stat block for this kind.
    ///
    /// ```
    /// use skirmish_core::units::UnitKind;
    ///
    /// assert_eq!(UnitKind::Infantry.stats().damage, 2);
    /// assert_eq!(UnitKind::Worker.stats().max_health, 3);
    /// ```
    #[must_use]
    pub const fn stats(self) -> UnitStats {
        match self {
            Self::Worker => UnitStats {
                max_health: 3,
                max_actions: 2,
                cost: 2,
                damage: 1,
            },
            Self::Infantry => UnitStats {
                max_health: 5,
                max_actions: 2,
                cost: 3,
                damage: 2,
            },
            Self::Scout => UnitStats {
                max_health: 3,
                max_actions: 4,
                cost: 3,
                damage: 1,
            },
            Self::Siege => UnitStats {
                max_health: 8,
                max_actions: 1,
                cost: 5,
                damage: 3,
            },
        }
    }

    /// Whether this kind may gather from resource nodes.
    #[must_use]
    pub const fn can_gather(self) -> bool {
        matches!(self, Self::Worker)
    }

    /// Cheapest build cost across the roster.
    #[must_use]
    pub fn cheapest_cost() -> u32 {
        Self::ALL
            .iter()
            .map(|kind| kind.stats().cost)
            .min()
            .unwrap_or(0)
    }

    /// Lowercase name, as used in snapshots and configs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Infantry => "infantry",
            Self::Scout => "scout",
            Self::Siege => "siege",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown unit kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit kind '{0}'")]
pub struct UnknownUnitKind(pub String);

impl FromStr for UnitKind {
    type Err = UnknownUnitKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownUnitKind(s.to_string()))
    }
}
