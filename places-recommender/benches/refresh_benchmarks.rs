//! Criterion benchmarks for the catalog-wide neighbour refresh.
//!
//! The refresh scans the full catalog once per site, so time grows with the
//! square of the catalog size. Catalog sizes of 100, 500 and 1000 sites cover
//! the range the engine targets.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package places-recommender
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Coord;
use places_core::{Site, SiteId, test_support::MemoryStore};
use places_recommender::RecommendationIndex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for deterministic catalog generation.
const BENCHMARK_SEED: u64 = 42;

/// Catalog sizes to benchmark.
const CATALOG_SIZES: &[usize] = &[100, 500, 1000];

/// Category labels assigned to generated sites.
const CATEGORIES: [&str; 6] = ["food", "museum", "park", "church", "market", "viewpoint"];

/// Generate `count` sites scattered over roughly a 100 km square.
fn generate_catalog(count: usize, seed: u64) -> Vec<Site> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .filter_map(|i| {
            let location = Coord {
                x: rng.gen_range(-74.5..-73.5),
                y: rng.gen_range(4.0..5.0),
            };
            let categories = (0..rng.gen_range(1..=2))
                .filter_map(|_| CATEGORIES.get(rng.gen_range(0..CATEGORIES.len())))
                .map(|label| (*label).to_owned())
                .collect();
            let id = SiteId::new(format!("site-{i}")).ok()?;
            Site::new(id, format!("Site {i}"), categories, location).ok()
        })
        .collect()
}

fn bench_refresh_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_all");
    group.sample_size(20);

    for &size in CATALOG_SIZES {
        let store = MemoryStore::with_sites(generate_catalog(size, BENCHMARK_SEED));
        let index = RecommendationIndex::new(&store);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| index.refresh_all());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_refresh_all);
criterion_main!(benches);
