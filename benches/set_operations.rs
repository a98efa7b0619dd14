//! Benchmarks comparing the three execution tiers on synthetic universes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cardgrid::{CardUniverse, SetOpsEngine, Tier, ZoneConfig};

/// Build a universe of n cards over a small tag vocabulary
fn build_universe(n: usize) -> CardUniverse {
    let universe = CardUniverse::new();
    let entries: Vec<(String, Vec<&str>)> = (0..n)
        .map(|i| {
            let mut tags = vec![["red", "green", "blue", "cyan"][i % 4]];
            if i % 3 == 0 {
                tags.push("priority");
            }
            if i % 10 == 0 {
                tags.push("archived");
            }
            (format!("card-{}", i), tags)
        })
        .collect();
    universe.extend(
        entries
            .iter()
            .map(|(id, tags)| (id.as_str(), tags.as_slice())),
    );
    universe
}

fn bench_tiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_tiers");

    for size in [1_000, 20_000, 120_000] {
        let universe = build_universe(size);
        let snapshot = universe.snapshot();
        let engine = SetOpsEngine::with_defaults();
        let config = ZoneConfig::new()
            .with_intersection(["priority"])
            .with_union(["red", "blue"])
            .with_exclusion(["archived"]);

        for tier in [Tier::Regular, Tier::Parallel, Tier::Turbo] {
            group.bench_with_input(
                BenchmarkId::new(tier.to_string(), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let result = engine
                            .filter_with_tier(black_box(&snapshot), black_box(&config), tier)
                            .unwrap();
                        black_box(result.len())
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let universe = build_universe(20_000);
    let snapshot = universe.snapshot();
    let engine = SetOpsEngine::with_defaults();
    let partitioner = cardgrid::GridPartitioner::with_defaults();
    let config = ZoneConfig::new()
        .with_rows(["priority"])
        .with_columns(["red", "green", "blue", "cyan"]);
    let filtered = engine.filter(&snapshot, &config).unwrap();

    c.bench_function("grid_partition_20k", |b| {
        b.iter(|| {
            let output = partitioner
                .partition(black_box(&snapshot), black_box(&filtered.cards), &config)
                .unwrap();
            black_box(output.grid.cell_count())
        })
    });
}

criterion_group!(benches, bench_tiers, bench_grid);
criterion_main!(benches);
