//! Synchronous event channel.
//!
//! Subsystems record [`GameEvent`]s while a command runs; the engine then
//! publishes them through an [`EventBus`] in the order they happened.
//! Listeners are kept in one ordered list per [`EventKind`], plus a list of
//! catch-all listeners that see every event after the kind-specific ones.
//!
//! Listeners receive `&GameEvent` and have no path back to the engine, so
//! they cannot mutate game state from inside a callback.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use skirmish_core::events::{EventBus, EventKind, GameEvent};
//!
//! let mut bus = EventBus::new();
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//! bus.subscribe(EventKind::DrawDeclared, move |_| counter.set(counter.get() + 1));
//!
//! bus.publish(&GameEvent::DrawDeclared);
//! assert_eq!(seen.get(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::{BaseId, EntityRef, NodeId, PlayerId, UnitId};
use crate::grid::Position;
use crate::turn::Phase;
use crate::units::UnitKind;
use crate::victory::{Outcome, VictoryReason};

/// Something that happened inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameEvent {
    /// The game left the `ready` state.
    GameStarted {
        /// Player who moves first.
        first_player: PlayerId,
    },
    /// A new phase began.
    PhaseChanged {
        /// Player whose turn it is.
        player: PlayerId,
        /// The phase entered.
        phase: Phase,
        /// Turn number.
        turn: u32,
    },
    /// A unit was built.
    UnitCreated {
        /// New unit.
        unit: UnitId,
        /// Its kind.
        kind: UnitKind,
        /// Owning player.
        owner: PlayerId,
        /// Spawn cell.
        position: Position,
    },
    /// A unit moved.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Previous cell.
        from: Position,
        /// New cell.
        to: Position,
        /// Actions charged.
        cost: u32,
    },
    /// A unit attacked something.
    UnitAttacked {
        /// Attacking unit.
        attacker: UnitId,
        /// Entity hit.
        target: EntityRef,
        /// Damage dealt.
        damage: u32,
        /// Target health after the hit.
        remaining_health: u32,
        /// Whether the hit destroyed the target.
        destroyed: bool,
    },
    /// A unit died and left the board.
    UnitRemoved {
        /// Removed unit.
        unit: UnitId,
        /// Former owner.
        owner: PlayerId,
        /// Cell it occupied.
        position: Position,
    },
    /// A base reached zero health.
    BaseDestroyed {
        /// Destroyed base.
        base: BaseId,
        /// Its owner.
        owner: PlayerId,
        /// Cell it stood on.
        position: Position,
    },
    /// A worker gathered from a node.
    ResourceGathered {
        /// Gathering unit.
        unit: UnitId,
        /// Node harvested.
        node: NodeId,
        /// Energy gained.
        amount: u32,
    },
    /// Victory conditions were evaluated.
    VictoryCheck {
        /// Result of the evaluation.
        outcome: Outcome,
    },
    /// A player conceded.
    PlayerSurrendered {
        /// Conceding player.
        player: PlayerId,
    },
    /// Both players agreed to a draw.
    DrawDeclared,
    /// Neither player has a legal move, attack or build left.
    StalemateDetected,
    /// The game ended.
    GameEnded {
        /// Final result.
        outcome: Outcome,
        /// What ended it.
        reason: VictoryReason,
    },
}

impl GameEvent {
    /// The subscription channel this event is published on.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::GameStarted { .. } => EventKind::GameStarted,
            Self::PhaseChanged { .. } => EventKind::PhaseChanged,
            Self::UnitCreated { .. } => EventKind::UnitCreated,
            Self::UnitMoved { .. } => EventKind::UnitMoved,
            Self::UnitAttacked { .. } => EventKind::UnitAttacked,
            Self::UnitRemoved { .. } => EventKind::UnitRemoved,
            Self::BaseDestroyed { .. } => EventKind::BaseDestroyed,
            Self::ResourceGathered { .. } => EventKind::ResourceGathered,
            Self::VictoryCheck { .. } => EventKind::VictoryCheck,
            Self::PlayerSurrendered { .. } => EventKind::PlayerSurrendered,
            Self::DrawDeclared => EventKind::DrawDeclared,
            Self::StalemateDetected => EventKind::StalemateDetected,
            Self::GameEnded { .. } => EventKind::GameEnded,
        }
    }
}

/// Event channel names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// [`GameEvent::GameStarted`]
    GameStarted,
    /// [`GameEvent::PhaseChanged`]
    PhaseChanged,
    /// [`GameEvent::UnitCreated`]
    UnitCreated,
    /// [`GameEvent::UnitMoved`]
    UnitMoved,
    /// [`GameEvent::UnitAttacked`]
    UnitAttacked,
    /// [`GameEvent::UnitRemoved`]
    UnitRemoved,
    /// [`GameEvent::BaseDestroyed`]
    BaseDestroyed,
    /// [`GameEvent::ResourceGathered`]
    ResourceGathered,
    /// [`GameEvent::VictoryCheck`]
    VictoryCheck,
    /// [`GameEvent::PlayerSurrendered`]
    PlayerSurrendered,
    /// [`GameEvent::DrawDeclared`]
    DrawDeclared,
    /// [`GameEvent::StalemateDetected`]
    StalemateDetected,
    /// [`GameEvent::GameEnded`]
    GameEnded,
}

impl EventKind {
    /// Channel name as collaborators see it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GameStarted => "gameStarted",
            Self::PhaseChanged => "phaseChanged",
            Self::UnitCreated => "unitCreated",
            Self::UnitMoved => "unitMoved",
            Self::UnitAttacked => "unitAttacked",
            Self::UnitRemoved => "unitRemoved",
            Self::BaseDestroyed => "baseDestroyed",
            Self::ResourceGathered => "resourceGathered",
            Self::VictoryCheck => "victoryCheck",
            Self::PlayerSurrendered => "playerSurrendered",
            Self::DrawDeclared => "drawDeclared",
            Self::StalemateDetected => "stalemateDetected",
            Self::GameEnded => "gameEnded",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Ordered, synchronous listener registry.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    by_kind: BTreeMap<EventKind, Vec<(SubscriptionId, Listener)>>,
    catch_all: Vec<(SubscriptionId, Listener)>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    /// Register `listener` for one event kind. Listeners for the same kind
    /// run in registration order.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let id = self.allocate_id();
        self.by_kind
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Register `listener` for every event.
    pub fn subscribe_all<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let id = self.allocate_id();
        self.catch_all.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listener_count();
        for listeners in self.by_kind.values_mut() {
            listeners.retain(|(sub, _)| *sub != id);
        }
        self.catch_all.retain(|(sub, _)| *sub != id);
        self.listener_count() < before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum::<usize>() + self.catch_all.len()
    }

    /// Deliver `event` to its kind's listeners, then to catch-all listeners.
    pub fn publish(&mut self, event: &GameEvent) {
        if let Some(listeners) = self.by_kind.get_mut(&event.kind()) {
            for (_, listener) in listeners.iter_mut() {
                listener(event);
            }
        }
        for (_, listener) in &mut self.catch_all {
            listener(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Listener = Box<dyn FnMut(&GameEvent)>;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Listener) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let shared = Rc::clone(&log);
        let make = move |tag: &'static str| -> Listener {
            let log = Rc::clone(&shared);
            Box::new(move |event: &GameEvent| {
                log.borrow_mut().push(format!("{tag}:{}", event.kind()));
            })
        };
        (log, make)
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let (log, make) = recorder();
        let mut bus = EventBus::new();
        bus.subscribe_all(make("all"));
        bus.subscribe(EventKind::DrawDeclared, make("first"));
        bus.subscribe(EventKind::DrawDeclared, make("second"));
        bus.subscribe(EventKind::StalemateDetected, make("other"));

        bus.publish(&GameEvent::DrawDeclared);

        assert_eq!(
            *log.borrow(),
            vec!["first:drawDeclared", "second:drawDeclared", "all:drawDeclared"]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let (log, make) = recorder();
        let mut bus = EventBus::new();
        let id = bus.subscribe(EventKind::StalemateDetected, make("gone"));
        assert_eq!(bus.listener_count(), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&GameEvent::StalemateDetected);

        assert!(log.borrow().is_empty());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_event_kind_names() {
        let event = GameEvent::PlayerSurrendered {
            player: PlayerId::ONE,
        };
        assert_eq!(event.kind(), EventKind::PlayerSurrendered);
        assert_eq!(event.kind().as_str(), "playerSurrendered");
    }
}
