//! Integration tests for the economy core against the shipped catalogs.

use idlecraft_economy::{
    BaseYield, Catalog, Economy, EconomyError, EconomyState, InventoryFilters, ItemType,
    UnlockOutcome,
};

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data");

fn create_economy(seed: u64) -> Economy {
    Economy::new(Catalog::from_dir(DATA_DIR).unwrap(), seed, ())
}

#[test]
fn test_shipped_catalogs_load() {
    let catalog = Catalog::from_dir(DATA_DIR).unwrap();

    assert_eq!(catalog.resources().count(), 3);
    assert_eq!(catalog.crafts().len(), 11);
    assert!(catalog.crafts().find_cycle().is_none());
    for upgrade in catalog.upgrades().iter() {
        assert!(!upgrade.unlocked, "{} starts unlocked", upgrade.key);
    }
}

#[test]
fn test_wooden_axe_from_ten_logs() {
    let mut economy = create_economy(1);
    economy.grant("oak_log", 10).unwrap();

    let receipt = economy.craft("wooden_axe").unwrap();

    assert_eq!(receipt.produced, ("wooden_axe".to_string(), 1));
    assert_eq!(economy.item_count("oak_log"), 0);
    assert_eq!(economy.item_count("wooden_axe"), 1);
    assert_eq!(economy.inventory().len(), 1);
}

#[test]
fn test_stone_axe_needs_every_input() {
    let mut economy = create_economy(2);
    economy.grant("cobblestone", 15).unwrap();
    economy.grant("oak_log", 15).unwrap();
    let before = economy.inventory().clone();

    let declined = economy.craft("stone_axe");
    assert_eq!(
        declined,
        Err(EconomyError::InsufficientResources {
            item: "wooden_axe".to_string(),
            required: 1,
            available: 0,
        })
    );
    assert_eq!(economy.inventory(), &before);

    economy.craft("wooden_axe").unwrap();
    economy.craft("stone_axe").unwrap();

    assert_eq!(economy.item_count("stone_axe"), 1);
    assert_eq!(economy.item_count("wooden_axe"), 0);
    assert_eq!(economy.item_count("cobblestone"), 0);
    assert_eq!(economy.item_count("oak_log"), 0);
}

#[test]
fn test_non_stackable_crafts_stay_separate() {
    let mut economy = create_economy(3);
    economy.grant("oak_log", 24).unwrap();

    economy.craft("wooden_sword").unwrap();
    economy.craft("wooden_sword").unwrap();

    let swords: Vec<_> = economy
        .inventory()
        .iter()
        .filter(|i| i.id() == "wooden_sword")
        .collect();
    assert_eq!(swords.len(), 2);
    assert_ne!(swords[0].instance_id, swords[1].instance_id);
    assert!(swords.iter().all(|s| s.quantity.is_none()));
}

#[test]
fn test_upgrade_is_one_shot() {
    let mut economy = create_economy(4);
    economy.grant("oak_log", 60).unwrap();

    assert_eq!(economy.unlock_upgrade("sharper_axe"), Ok(UnlockOutcome::Unlocked));
    assert_eq!(economy.item_count("oak_log"), 35);

    assert_eq!(
        economy.unlock_upgrade("sharper_axe"),
        Ok(UnlockOutcome::AlreadyUnlocked)
    );
    assert_eq!(economy.item_count("oak_log"), 35);
}

#[test]
fn test_declined_upgrade_changes_nothing() {
    let mut economy = create_economy(5);
    economy.grant("oak_log", 24).unwrap();
    let before = economy.save_state();

    assert!(economy.unlock_upgrade("sharper_axe").unwrap_err().is_insufficient());
    assert_eq!(economy.save_state(), before);
}

#[test]
fn test_wood_always_drops_a_log() {
    let mut economy = create_economy(6);

    for _ in 0..500 {
        let grants = economy.resolve_break("wood", &BaseYield).unwrap();
        let logs: u32 = grants.iter().map(|(_, q)| q).sum();
        assert!((1..=3).contains(&logs));
    }
    assert!(economy.item_count("oak_log") >= 500);
    assert_eq!(economy.inventory().len(), 1);
}

#[test]
fn test_filters_never_mutate() {
    let mut economy = create_economy(7);
    economy.grant("oak_log", 40).unwrap();
    economy.craft("wooden_axe").unwrap();
    economy.craft("shield").unwrap();
    let before = economy.inventory().clone();

    let all = economy.filtered_items();
    assert_eq!(all.len(), before.len());

    let armor = economy.filtered_with(&InventoryFilters {
        item_type: Some(ItemType::Armor),
        ..InventoryFilters::default()
    });
    assert_eq!(armor.len(), 1);
    assert_eq!(armor[0].id(), "shield");

    let nothing = economy.filtered_with(&InventoryFilters {
        search: Some("diamond".to_string()),
        ..InventoryFilters::default()
    });
    assert!(nothing.is_empty());
    assert_eq!(economy.inventory(), &before);
}

#[test]
fn test_state_survives_toml() {
    #[derive(serde::Serialize, serde::Deserialize)]
    struct SaveFile {
        economy: EconomyState,
    }

    let mut economy = create_economy(8);
    economy.grant("oak_log", 40).unwrap();
    economy.craft("wooden_pickaxe").unwrap();
    economy.unlock_upgrade("sharper_axe").unwrap();

    let text = toml::to_string(&SaveFile {
        economy: economy.save_state(),
    })
    .unwrap();
    let parsed: SaveFile = toml::from_str(&text).unwrap();

    let mut restored = create_economy(9);
    restored.load_state(parsed.economy).unwrap();

    assert_eq!(restored.inventory(), economy.inventory());
    assert!(restored.upgrades().is_unlocked("sharper_axe"));
}
