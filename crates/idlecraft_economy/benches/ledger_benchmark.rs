//! Benchmark for ledger and crafting hot paths.
//!
//! Run with: cargo bench --package idlecraft_economy --bench ledger_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use idlecraft_economy::{BaseYield, Catalog, Economy, InventoryFilters, ItemType};

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data");

fn create_test_economy() -> Economy {
    let catalog = Catalog::from_dir(DATA_DIR).unwrap();
    Economy::new(catalog, 7, ())
}

fn benchmark_stackable_add(c: &mut Criterion) {
    let mut economy = create_test_economy();
    economy.grant("wooden_sword", 1).unwrap();
    economy.grant("cobblestone", 1).unwrap();

    c.bench_function("stackable_add_merge", |b| {
        b.iter(|| economy.grant(black_box("oak_log"), black_box(1)));
    });
}

fn benchmark_item_count(c: &mut Criterion) {
    let mut economy = create_test_economy();
    // A ledger with many non-stackable entries
    for _ in 0..200 {
        economy.grant("wooden_axe", 1).unwrap();
    }
    economy.grant("oak_log", 500).unwrap();

    c.bench_function("item_count_200_entries", |b| {
        b.iter(|| black_box(economy.item_count(black_box("wooden_axe"))));
    });
}

fn benchmark_craft_transaction(c: &mut Criterion) {
    c.bench_function("craft_wooden_axe", |b| {
        b.iter(|| {
            let mut economy = create_test_economy();
            economy.grant("oak_log", 10).unwrap();
            black_box(economy.craft("wooden_axe"))
        });
    });
}

fn benchmark_declined_craft(c: &mut Criterion) {
    let mut economy = create_test_economy();
    economy.grant("cobblestone", 15).unwrap();

    c.bench_function("craft_declined", |b| {
        b.iter(|| black_box(economy.craft(black_box("stone_axe")).is_err()));
    });
}

fn benchmark_resolve_break(c: &mut Criterion) {
    let mut economy = create_test_economy();

    c.bench_function("resolve_break_wood", |b| {
        b.iter(|| black_box(economy.resolve_break("wood", &BaseYield)));
    });
}

fn benchmark_filter(c: &mut Criterion) {
    let mut economy = create_test_economy();
    for _ in 0..100 {
        economy.grant("stone_sword", 1).unwrap();
        economy.grant("wooden_pickaxe", 1).unwrap();
    }
    let filters = InventoryFilters {
        search: Some("pick".to_string()),
        item_type: Some(ItemType::Tool),
        ..InventoryFilters::default()
    };

    c.bench_function("filter_200_entries", |b| {
        b.iter(|| black_box(economy.filtered_with(&filters).len()));
    });
}

criterion_group!(
    benches,
    benchmark_stackable_add,
    benchmark_item_count,
    benchmark_craft_transaction,
    benchmark_declined_craft,
    benchmark_resolve_break,
    benchmark_filter,
);
criterion_main!(benches);
