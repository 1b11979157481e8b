//! # IDLECRAFT Economy
//!
//! The inventory and economy core of IDLECRAFT.
//!
//! ## Design Principles
//!
//! 1. **One ledger** - Stackable items merge, everything else gets its own instance
//! 2. **Transactional crafting** - A craft either completes or changes nothing
//! 3. **One-shot upgrades** - Paid once, applied once, never re-locked
//! 4. **External configuration** - All balance data in TOML files
//!
//! ## Ownership
//!
//! [`Economy`] owns the ledger and every catalog. All mutations take
//! `&mut self`; a caller sharing the game across threads wraps it in a lock.
//!
//! ## Example
//!
//! ```rust,ignore
//! use idlecraft_economy::{BaseYield, Catalog, Economy};
//!
//! let catalog = Catalog::from_dir("data")?;
//! let mut economy = Economy::new(catalog, 42, ());
//!
//! economy.resolve_break("wood", &BaseYield)?;
//! if economy.can_craft("wooden_axe").is_ok() {
//!     economy.craft("wooden_axe")?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod crafting;
pub mod economy;
pub mod error;
pub mod inventory;
pub mod item;
pub mod loot;
pub mod upgrades;

pub use catalog::{Catalog, CatalogSources};
pub use crafting::{CostEntry, Craft, CraftBook, CraftKey, CraftOutput, CraftReceipt};
pub use economy::{Economy, EconomyHooks, EconomyState, UseOutcome};
pub use error::{EconomyError, EconomyResult};
pub use inventory::{
    Inventory, InventoryFilters, ItemInstance, INSTANCE_ID_LEN, SEARCH_ALL, TYPE_ALL,
};
pub use item::{
    EquipmentSlot, ItemDefinition, ItemEffect, ItemKey, ItemKind, ItemType, ToolType,
};
pub use loot::{
    apply_multiplier, roll_node, BaseYield, LootDrop, LootGrant, LootStatistics, ResourceKey,
    ResourceNode, YieldMultiplier,
};
pub use upgrades::{
    UnlockOutcome, Upgrade, UpgradeCost, UpgradeEffect, UpgradeKey, UpgradeTree,
};
