//! # Item Definitions
//!
//! Immutable item archetypes loaded from the item catalog.
//!
//! The type-specific payload is a closed enum: adding a new item type is a
//! compile error everywhere items are dispatched on, never a silent default.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable catalog key of an item definition (e.g. `oak_log`).
pub type ItemKey = String;

/// Tool families. Each resource node names the one it yields to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Chops wood.
    Axe,
    /// Breaks stone and ore.
    Pickaxe,
    /// Digs soil.
    Shovel,
    /// Tills soil.
    Hoe,
}

impl ToolType {
    /// The equipment slot a tool of this family occupies by default.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> EquipmentSlot {
        match self {
            Self::Axe => EquipmentSlot::Axe,
            Self::Pickaxe => EquipmentSlot::Pickaxe,
            Self::Shovel => EquipmentSlot::Shovel,
            Self::Hoe => EquipmentSlot::Hoe,
        }
    }
}

/// Equipment slots. Tools get one slot per family so that an axe and a
/// pickaxe can be held at the same time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    /// Helmets.
    Head,
    /// Chestplates.
    Chest,
    /// Leggings.
    Legs,
    /// Boots.
    Feet,
    /// Weapons.
    MainHand,
    /// Shields.
    OffHand,
    /// Axe tools.
    Axe,
    /// Pickaxe tools.
    Pickaxe,
    /// Shovel tools.
    Shovel,
    /// Hoe tools.
    Hoe,
}

/// Effect carried by a consumable. `id` selects the handler in the effect
/// registry; the rest is passed through as the descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemEffect {
    /// Registry key of the effect handler.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Icon texture.
    pub icon: String,
    /// Duration in milliseconds, for timed effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Effect magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Type-specific payload of an item definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Gathering tool.
    Tool {
        /// Tool family.
        tool_type: ToolType,
        /// Damage dealt to resource nodes per hit.
        damage: u32,
        /// Slot override; defaults to the tool family's slot.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equipment_slot: Option<EquipmentSlot>,
    },
    /// Weapon.
    Weapon {
        /// Damage dealt per hit.
        damage: u32,
        /// Attacks per second.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attack_speed: Option<f64>,
        /// Slot the weapon occupies.
        equipment_slot: EquipmentSlot,
    },
    /// Wearable armor.
    Armor {
        /// Damage reduction.
        defense: u32,
        /// Slot the armor occupies.
        equipment_slot: EquipmentSlot,
    },
    /// Item with a registered effect.
    Consumable {
        /// The effect applied on use.
        effect: ItemEffect,
        /// Whether one unit is removed from the ledger on use.
        #[serde(default)]
        consume_on_use: bool,
    },
    /// Item with no behavior of its own.
    Generic,
    /// Gathered raw material.
    Resource,
}

impl ItemKind {
    /// The bare type tag of this payload.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Tool { .. } => ItemType::Tool,
            Self::Weapon { .. } => ItemType::Weapon,
            Self::Armor { .. } => ItemType::Armor,
            Self::Consumable { .. } => ItemType::Consumable,
            Self::Generic => ItemType::Generic,
            Self::Resource => ItemType::Resource,
        }
    }
}

/// Type tags, used by inventory filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// See [`ItemKind::Tool`].
    Tool,
    /// See [`ItemKind::Weapon`].
    Weapon,
    /// See [`ItemKind::Armor`].
    Armor,
    /// See [`ItemKind::Consumable`].
    Consumable,
    /// See [`ItemKind::Generic`].
    Generic,
    /// See [`ItemKind::Resource`].
    Resource,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tool => "tool",
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Consumable => "consumable",
            Self::Generic => "generic",
            Self::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// An item definition from the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Stable catalog key.
    pub id: ItemKey,
    /// Display name.
    pub name: String,
    /// Display description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Texture identifier.
    pub texture: String,
    /// Whether owned units share one ledger entry.
    pub stackable: bool,
    /// Type-specific payload.
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl ItemDefinition {
    /// Creates a definition with no description.
    #[must_use]
    pub fn new(
        id: impl Into<ItemKey>,
        name: impl Into<String>,
        texture: impl Into<String>,
        stackable: bool,
        kind: ItemKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            texture: texture.into(),
            stackable,
            kind,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Units an add of `quantity` puts in the ledger. Non-stackable items
    /// always add a single entry.
    #[inline]
    #[must_use]
    pub const fn units_added(&self, quantity: u32) -> u32 {
        if self.stackable {
            quantity
        } else {
            1
        }
    }

    /// The type tag of this item.
    #[inline]
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    /// The slot this item equips into, if it is equipment.
    #[must_use]
    pub fn equipment_slot(&self) -> Option<EquipmentSlot> {
        match &self.kind {
            ItemKind::Tool {
                tool_type,
                equipment_slot,
                ..
            } => Some(equipment_slot.unwrap_or_else(|| tool_type.slot())),
            ItemKind::Weapon { equipment_slot, .. } | ItemKind::Armor { equipment_slot, .. } => {
                Some(*equipment_slot)
            }
            ItemKind::Consumable { .. } | ItemKind::Generic | ItemKind::Resource => None,
        }
    }

    /// Tool family and damage, if this is a tool.
    #[must_use]
    pub const fn as_tool(&self) -> Option<(ToolType, u32)> {
        match &self.kind {
            ItemKind::Tool {
                tool_type, damage, ..
            } => Some((*tool_type, *damage)),
            _ => None,
        }
    }
}
