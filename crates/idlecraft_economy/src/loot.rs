//! # Loot Table System
//!
//! Resolves what a broken resource node drops.
//!
//! Every drop in a node's table is an independent roll:
//!
//! 1. Bernoulli trial against `chance`
//! 2. Uniform quantity in `[min_quantity, max_quantity]`
//! 3. If the drop names a resource type, scale by the yield multiplier and floor
//!
//! Hit points, tool damage and critical hits live with the mining layer; this
//! module only answers "the node broke, what falls out".

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::item::{ItemDefinition, ItemKey, ToolType};

/// Resource category a yield multiplier is keyed by (e.g. `wood`).
pub type ResourceKey = String;

/// Source of per-resource yield multipliers.
pub trait YieldMultiplier {
    /// Multiplier for a resource category. Expected to be `>= 0`.
    fn multiplier(&self, resource_type: &str) -> f64;
}

impl<F> YieldMultiplier for F
where
    F: Fn(&str) -> f64,
{
    #[inline]
    fn multiplier(&self, resource_type: &str) -> f64 {
        self(resource_type)
    }
}

/// Yield source that leaves every quantity unscaled.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseYield;

impl YieldMultiplier for BaseYield {
    #[inline]
    fn multiplier(&self, _resource_type: &str) -> f64 {
        1.0
    }
}

/// Scales a drawn quantity, flooring the result. Negative and NaN
/// multipliers yield nothing.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_multiplier(quantity: u32, multiplier: f64) -> u32 {
    (f64::from(quantity) * multiplier.max(0.0)).floor() as u32
}

/// A single entry in a loot table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LootDrop {
    /// The item to drop.
    pub item: ItemDefinition,
    /// Minimum quantity (inclusive).
    pub min_quantity: u32,
    /// Maximum quantity (inclusive).
    pub max_quantity: u32,
    /// Drop probability in `[0, 1]`.
    pub chance: f64,
    /// Yield category this drop scales with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceKey>,
}

impl LootDrop {
    /// Multiplier applying to this drop.
    #[must_use]
    pub fn multiplier<Y: YieldMultiplier + ?Sized>(&self, yields: &Y) -> f64 {
        self.resource_type
            .as_deref()
            .map_or(1.0, |resource| yields.multiplier(resource))
    }

    /// Rolls this drop once. Returns zero when the chance roll fails or the
    /// scaled quantity floors to nothing.
    pub fn roll<R, Y>(&self, rng: &mut R, yields: &Y) -> u32
    where
        R: Rng + ?Sized,
        Y: YieldMultiplier + ?Sized,
    {
        if rng.gen::<f64>() >= self.chance {
            return 0;
        }

        let drawn = if self.min_quantity >= self.max_quantity {
            self.min_quantity
        } else {
            rng.gen_range(self.min_quantity..=self.max_quantity)
        };

        match self.resource_type.as_deref() {
            Some(resource) => apply_multiplier(drawn, yields.multiplier(resource)),
            None => drawn,
        }
    }

    /// Quantity range a successful roll can produce under `multiplier`, as
    /// shown next to each drop.
    #[must_use]
    pub fn preview(&self, multiplier: f64) -> (u32, u32) {
        if self.resource_type.is_none() {
            return (self.min_quantity, self.max_quantity);
        }
        (
            apply_multiplier(self.min_quantity, multiplier),
            apply_multiplier(self.max_quantity, multiplier),
        )
    }

    /// Chance as a whole percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn chance_percent(&self) -> u32 {
        (self.chance * 100.0).round().max(0.0) as u32
    }
}

/// A mineable resource node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Catalog key (also the yield category of its drops).
    pub key: ResourceKey,
    /// Display name.
    pub name: String,
    /// Texture identifier.
    pub texture: String,
    /// Hit points of a fresh node.
    pub hp: u32,
    /// The tool family that mines this node best.
    pub effective_tool: ToolType,
    /// Possible drops.
    pub loot_table: Vec<LootDrop>,
}

/// One successful drop from a break.
#[derive(Clone, Debug, PartialEq)]
pub struct LootGrant<'a> {
    /// The dropped item.
    pub item: &'a ItemDefinition,
    /// Final quantity, always `> 0`.
    pub quantity: u32,
}

/// Rolls every drop of a node once. Drops that come up empty are left out.
pub fn roll_node<'a, R, Y>(node: &'a ResourceNode, rng: &mut R, yields: &Y) -> Vec<LootGrant<'a>>
where
    R: Rng + ?Sized,
    Y: YieldMultiplier + ?Sized,
{
    node.loot_table
        .iter()
        .filter_map(|drop| {
            let quantity = drop.roll(rng, yields);
            (quantity > 0).then_some(LootGrant {
                item: &drop.item,
                quantity,
            })
        })
        .collect()
}

/// Statistics from repeated simulated breaks, for balancing.
#[derive(Clone, Debug, Default)]
pub struct LootStatistics {
    /// Breaks simulated.
    pub breaks: u64,
    /// Units dropped by item id.
    pub item_counts: HashMap<ItemKey, u64>,
}

impl LootStatistics {
    /// Simulates `iterations` breaks of a node without touching any ledger.
    pub fn simulate<R, Y>(node: &ResourceNode, rng: &mut R, yields: &Y, iterations: u32) -> Self
    where
        R: Rng + ?Sized,
        Y: YieldMultiplier + ?Sized,
    {
        let mut stats = Self::default();
        for _ in 0..iterations {
            stats.breaks += 1;
            for grant in roll_node(node, rng, yields) {
                *stats.item_counts.entry(grant.item.id.clone()).or_insert(0) +=
                    u64::from(grant.quantity);
            }
        }
        stats
    }

    /// Average units of an item per break.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_per_break(&self, item_id: &str) -> f64 {
        if self.breaks == 0 {
            return 0.0;
        }
        let total = self.item_counts.get(item_id).copied().unwrap_or(0);
        total as f64 / self.breaks as f64
    }
}
