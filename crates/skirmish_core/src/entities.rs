//! Entity definitions: players, units, bases and resource nodes.
//!
//! Entities are data plus self-mutation (taking damage, spending energy or
//! actions). Rules that involve more than one entity live in the subsystem
//! modules.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::units::{UnitKind, UnitStats};

/// Seat identifier. Player 1 moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u8);

impl PlayerId {
    /// First seat.
    pub const ONE: Self = Self(1);
    /// Second seat.
    pub const TWO: Self = Self(2);
    /// Both seats in turn order.
    pub const ALL: [Self; 2] = [Self::ONE, Self::TWO];

    /// Create a player id. Only `1` and `2` refer to seats.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw seat number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Self {
        if self.0 == 1 {
            Self::TWO
        } else {
            Self::ONE
        }
    }

    /// Whether this id names one of the two seats.
    #[must_use]
    pub const fn is_seat(self) -> bool {
        self.0 == 1 || self.0 == 2
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw id.
            #[must_use]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Raw id.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unit identifier. Never reused within a game.
    UnitId
);
entity_id!(
    /// Base identifier. Equal to the owning seat number.
    BaseId
);
entity_id!(
    /// Resource node identifier (index into the node list).
    NodeId
);

/// Reference to anything that can occupy a board cell.
///
/// Rendered as `U<id>` for units and `B<id>` for bases, which is also the
/// serialized form used in snapshot grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityRef {
    /// A unit.
    Unit(UnitId),
    /// A base.
    Base(BaseId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(id) => write!(f, "U{id}"),
            Self::Base(id) => write!(f, "B{id}"),
        }
    }
}

/// Error returned for malformed entity references.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed entity reference '{0}'")]
pub struct ParseEntityRefError(pub String);

impl FromStr for EntityRef {
    type Err = ParseEntityRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEntityRefError(s.to_string());
        let mut chars = s.chars();
        let tag = chars.next().ok_or_else(err)?;
        let id: u32 = chars.as_str().parse().map_err(|_| err())?;
        match tag {
            'U' => Ok(Self::Unit(UnitId::new(id))),
            'B' => Ok(Self::Base(BaseId::new(id))),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for EntityRef {
    type Error = ParseEntityRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityRef> for String {
    fn from(value: EntityRef) -> Self {
        value.to_string()
    }
}

/// Health pool for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create a health pool at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the pool is empty.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, flooring at zero. Returns the damage actually absorbed.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }
}

/// One of the two seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Seat.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Spendable currency.
    pub energy: u32,
    /// Actions left this turn.
    pub actions_remaining: u32,
    /// Live units owned by this player.
    pub units: BTreeSet<UnitId>,
    /// Total energy gathered from nodes over the game.
    pub resources_gathered: u32,
}

impl Player {
    /// Create a player with no units.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, energy: u32) -> Self {
        Self {
            id,
            name: name.into(),
            energy,
            actions_remaining: 0,
            units: BTreeSet::new(),
            resources_gathered: 0,
        }
    }

    /// Check if player can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.energy >= cost
    }

    /// Spend energy if available. Returns true if the spend succeeded.
    pub fn spend_energy(&mut self, amount: u32) -> bool {
        if self.can_afford(amount) {
            self.energy -= amount;
            true
        } else {
            false
        }
    }

    /// Add energy.
    pub fn gain_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_add(amount);
    }

    /// Consume one action from the per-turn budget. Returns false if exhausted.
    pub fn use_action(&mut self) -> bool {
        if self.actions_remaining == 0 {
            return false;
        }
        self.actions_remaining -= 1;
        true
    }
}

/// A unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Roster entry.
    pub kind: UnitKind,
    /// Owning seat.
    pub owner: PlayerId,
    /// Current cell.
    pub position: Position,
    /// Health pool.
    pub health: Health,
    /// Actions spent this turn.
    pub actions_used: u32,
}

impl Unit {
    /// Create a fresh unit at full health.
    #[must_use]
    pub fn new(id: UnitId, kind: UnitKind, owner: PlayerId, position: Position) -> Self {
        Self {
            id,
            kind,
            owner,
            position,
            health: Health::new(kind.stats().max_health),
            actions_used: 0,
        }
    }

    /// Stat block of this unit's kind.
    #[must_use]
    pub const fn stats(&self) -> UnitStats {
        self.kind.stats()
    }

    /// Per-turn action allowance.
    #[must_use]
    pub const fn max_actions(&self) -> u32 {
        self.kind.stats().max_actions
    }

    /// Actions still available this turn.
    #[must_use]
    pub const fn remaining_actions(&self) -> u32 {
        self.max_actions().saturating_sub(self.actions_used)
    }

    /// Spend `amount` actions. Returns false, leaving the unit untouched,
    /// when the unit cannot afford them.
    pub fn spend_actions(&mut self, amount: u32) -> bool {
        if amount > self.remaining_actions() {
            return false;
        }
        self.actions_used += amount;
        true
    }

    /// Start-of-turn reset.
    pub fn reset_actions(&mut self) {
        self.actions_used = 0;
    }
}

/// A player's headquarters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base {
    /// Identifier.
    pub id: BaseId,
    /// Owning seat.
    pub owner: PlayerId,
    /// Cell the base stands (or stood) on.
    pub position: Position,
    /// Health pool.
    pub health: Health,
    /// Set once, when health reaches zero.
    pub destroyed: bool,
}

impl Base {
    /// Create a standing base.
    #[must_use]
    pub const fn new(id: BaseId, owner: PlayerId, position: Position, health: u32) -> Self {
        Self {
            id,
            owner,
            position,
            health: Health::new(health),
            destroyed: false,
        }
    }

    /// Apply damage. Returns true if this hit destroyed the base.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        if self.destroyed {
            return false;
        }
        self.health.apply_damage(amount);
        if self.health.is_dead() {
            self.destroyed = true;
            return true;
        }
        false
    }
}

/// A depletable, regenerating resource deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    /// Identifier.
    pub id: NodeId,
    /// Cell the node sits on. Nodes do not occupy the board.
    pub position: Position,
    /// Resources currently available.
    pub value: u32,
    /// Cap for `value`.
    pub max_value: u32,
    /// Amount restored at each resource phase.
    pub regen_rate: u32,
    /// Turns each unit must wait before gathering here again.
    pub cooldowns: BTreeMap<UnitId, u32>,
}

impl ResourceNode {
    /// Create a node. `value` is clamped to `max_value`.
    #[must_use]
    pub fn new(
        id: NodeId,
        position: Position,
        value: u32,
        max_value: u32,
        regen_rate: u32,
    ) -> Self {
        Self {
            id,
            position,
            value: value.min(max_value),
            max_value,
            regen_rate,
            cooldowns: BTreeMap::new(),
        }
    }

    /// Check if this node is empty.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.value == 0
    }

    /// Remove up to `requested` from the node. Returns the amount removed.
    pub fn extract(&mut self, requested: u32) -> u32 {
        let extracted = requested.min(self.value);
        self.value -= extracted;
        extracted
    }

    /// Restore `regen_rate`, clamped to the maximum. Returns the amount restored.
    pub fn regenerate(&mut self) -> u32 {
        let before = self.value;
        self.value = self.value.saturating_add(self.regen_rate).min(self.max_value);
        self.value - before
    }

    /// Whether `unit` must wait before gathering here.
    #[must_use]
    pub fn on_cooldown(&self, unit: UnitId) -> bool {
        self.cooldowns.contains_key(&unit)
    }

    /// Start a cooldown for `unit`. A zero-turn cooldown is a no-op.
    pub fn start_cooldown(&mut self, unit: UnitId, turns: u32) {
        if turns > 0 {
            self.cooldowns.insert(unit, turns);
        }
    }

    /// Count down cooldowns of the units selected by `filter`, dropping
    /// expired entries.
    pub fn tick_cooldowns(&mut self, mut filter: impl FnMut(UnitId) -> bool) {
        self.cooldowns.retain(|unit, turns| {
            if filter(*unit) {
                *turns = turns.saturating_sub(1);
            }
            *turns > 0
        });
    }

    /// Forget a unit (it died).
    pub fn forget(&mut self, unit: UnitId) {
        self.cooldowns.remove(&unit);
    }
}
