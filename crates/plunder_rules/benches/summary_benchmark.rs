//! Benchmark for item summary parsing and profile evaluation.
//!
//! TARGET: a full corpse (125 items) summarized and filtered well under one refresh tick
//!
//! Run with: cargo bench --package plunder_rules --bench summary_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use plunder_rules::{ItemSummary, LootProfile, LootRules, Match};
use plunder_shared::WorldItem;

fn test_item(serial: u32) -> (WorldItem, Vec<String>) {
    let item = WorldItem {
        serial,
        itemid: 0x1086,
        amount: 1,
        name: "gold ring".to_string(),
        weight: 1,
        ..WorldItem::default()
    };
    let props = [
        "Insured",
        "Greater Magic Item",
        "Lower Reagent Cost 20%",
        "Faster Casting 1",
        "Spell Damage Increase 12%",
        "Hit Point Regeneration 2",
        "Luck 80",
        "Durability 45 / 45",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect();
    (item, props)
}

fn test_profile() -> LootProfile {
    LootProfile::new("bench")
        .with_rule(LootRules::new("Gold").with_base(Match::type_single(0x0EED)))
        .with_rule(
            LootRules::new("Caster")
                .with_base(Match::type_group(0x1085..=0x108A))
                .with_prop(Match::magic("Lower Reagent Cost", 25))
                .with_except(Match::property("Cursed")),
        )
        .with_rule(LootRules::new("Artifacts").with_prop(Match::rarity_range(4, 8)))
}

fn benchmark_summary_parse(c: &mut Criterion) {
    let (item, props) = test_item(0x4000_0001);

    c.bench_function("summary_from_parts_8_props", |b| {
        b.iter(|| black_box(ItemSummary::from_parts(black_box(&item), props.clone())));
    });
}

fn benchmark_corpse(c: &mut Criterion) {
    let items: Vec<_> = (0..125u32).map(|i| test_item(0x4000_0000 + i)).collect();
    let profile = test_profile();

    let mut group = c.benchmark_group("corpse");
    group.throughput(Throughput::Elements(items.len() as u64));

    group.bench_function("summarize_and_filter_125", |b| {
        b.iter(|| {
            items
                .iter()
                .map(|(item, props)| ItemSummary::from_parts(item, props.clone()))
                .filter(|s| profile.test(s))
                .count()
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_summary_parse, benchmark_corpse);
criterion_main!(benches);
