//! # Mining
//!
//! Hit points of resource nodes.
//!
//! A hit deals the damage of the tool equipped in the node's effective-tool
//! slot, or bare-hand damage without one. A critical hit multiplies it. When
//! a node's hit points reach zero it breaks and resets to full; the caller
//! then resolves its loot.

use rand::Rng;
use std::collections::HashMap;

use idlecraft_economy::{ResourceKey, ResourceNode};

use crate::config::MiningConfig;
use crate::equipment::Equipment;

/// Result of a single hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitOutcome {
    /// Damage dealt, after any critical multiplier.
    pub damage: u32,
    /// Whether the hit was critical.
    pub critical: bool,
    /// Hit points left. Back at max if the node broke.
    pub hp_remaining: u32,
    /// Whether the node broke.
    pub broken: bool,
}

/// Hit point tracker for every resource node.
#[derive(Clone, Debug)]
pub struct Mining {
    config: MiningConfig,
    hp: HashMap<ResourceKey, u32>,
}

impl Mining {
    /// Creates a tracker where every node is at full health.
    #[must_use]
    pub fn new(config: MiningConfig) -> Self {
        Self {
            config,
            hp: HashMap::new(),
        }
    }

    /// Hit scoring in use.
    #[must_use]
    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Current hit points of a node.
    #[must_use]
    pub fn current_hp(&self, node: &ResourceNode) -> u32 {
        self.hp.get(&node.key).copied().unwrap_or(node.hp)
    }

    /// Damage of a regular hit on a node with the given equipment.
    #[must_use]
    pub fn damage_for(&self, node: &ResourceNode, equipment: &Equipment) -> u32 {
        equipment
            .tool(node.effective_tool)
            .map_or(self.config.bare_hand_damage, |(_, damage)| damage)
    }

    /// Hits a node once.
    pub fn hit<R: Rng + ?Sized>(
        &mut self,
        node: &ResourceNode,
        equipment: &Equipment,
        rng: &mut R,
    ) -> HitOutcome {
        let base = self.damage_for(node, equipment);
        let critical = rng.gen::<f64>() < self.config.crit_chance;
        let damage = if critical {
            base.saturating_mul(self.config.crit_multiplier)
        } else {
            base
        };

        let remaining = self.current_hp(node).saturating_sub(damage);
        let broken = remaining == 0;
        let hp_remaining = if broken { node.hp } else { remaining };
        self.hp.insert(node.key.clone(), hp_remaining);

        HitOutcome {
            damage,
            critical,
            hp_remaining,
            broken,
        }
    }

    /// Restores every node to full health.
    pub fn reset(&mut self) {
        self.hp.clear();
    }
}
