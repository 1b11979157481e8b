//! # IDLECRAFT Event System
//!
//! Game state changes, queued for whoever draws the game.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │   Economy   │─────>│   Event     │─────>│     UI      │
//! │   + World   │      │   Channel   │      │  (drains)   │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Sending never blocks. When the channel is full the event is dropped; the
//! ledger stays the source of truth.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use idlecraft_economy::{EquipmentSlot, ItemKey, ResourceKey};
use tracing::debug;

use crate::ages::AgeKey;

/// Events emitted by the game.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    // =========================================================================
    // Ledger
    // =========================================================================
    /// Units were added to the inventory.
    ItemAdded {
        /// Item id.
        item: ItemKey,
        /// Units added.
        quantity: u32,
        /// New total held (not delta).
        total: u32,
    },

    /// Units were removed from the inventory.
    ItemRemoved {
        /// Item id.
        item: ItemKey,
        /// Units removed.
        quantity: u32,
        /// New total held (not delta).
        total: u32,
    },

    /// A craft completed.
    ItemCrafted {
        /// Craft key.
        craft: String,
        /// Produced item.
        item: ItemKey,
        /// Units produced.
        quantity: u32,
    },

    // =========================================================================
    // Progression
    // =========================================================================
    /// An upgrade was bought.
    UpgradeUnlocked {
        /// Upgrade key.
        upgrade: String,
    },

    /// The player moved to a later age.
    AgeAdvanced {
        /// Previous age.
        from: AgeKey,
        /// New age.
        to: AgeKey,
    },

    // =========================================================================
    // Mining
    // =========================================================================
    /// A resource node took a hit.
    ResourceHit {
        /// Node key.
        resource: ResourceKey,
        /// Damage dealt.
        damage: u32,
        /// Is critical hit?
        critical: bool,
        /// Hit points left (max again after a break).
        hp_remaining: u32,
    },

    /// A resource node broke and its loot was granted.
    ResourceBroken {
        /// Node key.
        resource: ResourceKey,
        /// Granted `(item, quantity)` pairs.
        drops: Vec<(ItemKey, u32)>,
    },

    // =========================================================================
    // Equipment & effects
    // =========================================================================
    /// An item was put into an equipment slot.
    ItemEquipped {
        /// Slot filled.
        slot: EquipmentSlot,
        /// Item id.
        item: ItemKey,
        /// Ledger instance id.
        instance_id: String,
    },

    /// An equipped item left the ledger and its slot was cleared.
    ItemUnequipped {
        /// Slot cleared.
        slot: EquipmentSlot,
        /// Item id.
        item: ItemKey,
    },

    /// A consumable effect started.
    EffectApplied {
        /// Effect id.
        effect: String,
        /// Duration in milliseconds, if timed.
        duration: Option<u64>,
    },

    /// A timed effect ran out.
    EffectExpired {
        /// Effect id.
        effect: String,
    },
}

/// Event bus.
///
/// Pre-allocates a bounded channel so a UI that stops draining can't grow
/// memory without limit.
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events queued before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle (clone for multiple consumers).
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a paired sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<GameEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                debug!(?event, "event bus full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<GameEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<GameEvent> {
        let mut events = Vec::with_capacity(self.receiver.len());
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<GameEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_send_receive() {
        let bus = EventBus::new(100);
        let sender = bus.sender();
        let receiver = bus.receiver();

        let event = GameEvent::ItemAdded {
            item: "oak_log".to_string(),
            quantity: 2,
            total: 7,
        };

        assert!(sender.send(event.clone()));
        assert!(receiver.has_events());
        assert_eq!(receiver.try_recv(), Some(event));
    }

    #[test]
    fn test_event_drain() {
        let (sender, receiver) = EventBus::create_pair(100);

        for i in 0..10 {
            let _ = sender.send(GameEvent::ResourceHit {
                resource: "wood".to_string(),
                damage: 10,
                critical: false,
                hp_remaining: 100 - i * 10,
            });
        }

        let events = receiver.drain();
        assert_eq!(events.len(), 10);
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_full_bus_drops() {
        let (sender, receiver) = EventBus::create_pair(1);

        assert!(sender.send(GameEvent::UpgradeUnlocked {
            upgrade: "sharper_axe".to_string(),
        }));
        assert!(!sender.send(GameEvent::UpgradeUnlocked {
            upgrade: "stone_age".to_string(),
        }));
        assert_eq!(receiver.pending_count(), 1);
    }
}
