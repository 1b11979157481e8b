//! Equipped items, one per slot.
//!
//! Equipping does not take the entry out of the inventory. An equipped entry
//! that later leaves the inventory (consumed by a craft, say) is dropped from
//! its slot by [`Equipment::prune`].

use std::collections::HashMap;

use idlecraft_economy::{EquipmentSlot, Inventory, ItemInstance, ToolType};

/// The player's equipment.
#[derive(Clone, Debug, Default)]
pub struct Equipment {
    slots: HashMap<EquipmentSlot, ItemInstance>,
}

impl Equipment {
    /// Creates empty equipment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts an entry in its slot. Returns the slot and the entry it replaced,
    /// or `None` if the item is not equipment.
    pub fn equip(
        &mut self,
        instance: ItemInstance,
    ) -> Option<(EquipmentSlot, Option<ItemInstance>)> {
        let slot = instance.item.equipment_slot()?;
        let previous = self.slots.insert(slot, instance);
        Some((slot, previous))
    }

    /// Empties a slot.
    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<ItemInstance> {
        self.slots.remove(&slot)
    }

    /// What sits in a slot.
    #[must_use]
    pub fn get(&self, slot: EquipmentSlot) -> Option<&ItemInstance> {
        self.slots.get(&slot)
    }

    /// The tool in a family's slot and its damage, if that slot holds a tool
    /// of that family.
    #[must_use]
    pub fn tool(&self, tool_type: ToolType) -> Option<(&ItemInstance, u32)> {
        let instance = self.slots.get(&tool_type.slot())?;
        match instance.item.as_tool() {
            Some((equipped_type, damage)) if equipped_type == tool_type => {
                Some((instance, damage))
            }
            _ => None,
        }
    }

    /// Occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (EquipmentSlot, &ItemInstance)> {
        self.slots.iter().map(|(slot, instance)| (*slot, instance))
    }

    /// Empties every slot whose entry is no longer in the inventory. Returns
    /// what was removed.
    pub fn prune(&mut self, inventory: &Inventory) -> Vec<(EquipmentSlot, ItemInstance)> {
        let stale: Vec<EquipmentSlot> = self
            .slots
            .iter()
            .filter(|(_, instance)| inventory.get(&instance.instance_id).is_none())
            .map(|(slot, _)| *slot)
            .collect();

        stale
            .into_iter()
            .filter_map(|slot| self.slots.remove(&slot).map(|instance| (slot, instance)))
            .collect()
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlecraft_economy::{ItemDefinition, ItemKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn axe(id: &str, damage: u32) -> ItemDefinition {
        ItemDefinition::new(
            id,
            id,
            format!("item:{id}"),
            false,
            ItemKind::Tool {
                tool_type: ToolType::Axe,
                damage,
                equipment_slot: None,
            },
        )
    }

    #[test]
    fn test_equip_replaces_slot() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut inventory = Inventory::new();
        let wooden = inventory.add(&axe("wooden_axe", 20), 1, &mut rng).cloned().unwrap();
        let stone = inventory.add(&axe("stone_axe", 35), 1, &mut rng).cloned().unwrap();
        let mut equipment = Equipment::new();

        let (slot, previous) = equipment.equip(wooden.clone()).unwrap();
        assert_eq!(slot, EquipmentSlot::Axe);
        assert!(previous.is_none());

        let (_, previous) = equipment.equip(stone).unwrap();
        assert_eq!(previous, Some(wooden));
        assert_eq!(equipment.tool(ToolType::Axe).map(|(_, d)| d), Some(35));
        assert!(equipment.tool(ToolType::Pickaxe).is_none());
    }

    #[test]
    fn test_non_equipment_is_refused() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut inventory = Inventory::new();
        let log = ItemDefinition::new("oak_log", "Oak Log", "block:oak_log", true, ItemKind::Resource);
        let entry = inventory.add(&log, 3, &mut rng).cloned().unwrap();

        assert!(Equipment::new().equip(entry).is_none());
    }

    #[test]
    fn test_prune_drops_missing_entries() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut inventory = Inventory::new();
        let wooden = inventory.add(&axe("wooden_axe", 20), 1, &mut rng).cloned().unwrap();
        let mut equipment = Equipment::new();
        equipment.equip(wooden);

        assert!(equipment.prune(&inventory).is_empty());

        inventory.remove("wooden_axe", 1);
        let pruned = equipment.prune(&inventory);
        assert_eq!(pruned.len(), 1);
        assert!(equipment.get(EquipmentSlot::Axe).is_none());
    }
}
