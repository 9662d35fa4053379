use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use lexidrill_core::model::Entry;
use lexidrill_core::sampler::{sample, selection_probabilities};

fn make_entries(n: usize) -> Vec<Entry> {
    (0..n)
        .map(|i| {
            Entry::new(format!("word_{i}"), format!("slowo_{i}"), "polish")
                .with_level((i % 5) as i64 + 1)
        })
        .collect()
}

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");

    let small = make_entries(10);
    let medium = make_entries(1_000);
    let large = make_entries(100_000);
    let mut rng = StdRng::seed_from_u64(42);

    group.bench_function("10_entries", |b| {
        b.iter(|| sample(black_box(&small), &mut rng).map(|e| e.id))
    });

    group.bench_function("1000_entries", |b| {
        b.iter(|| sample(black_box(&medium), &mut rng).map(|e| e.id))
    });

    group.bench_function("100000_entries", |b| {
        b.iter(|| sample(black_box(&large), &mut rng).map(|e| e.id))
    });

    group.finish();
}

fn bench_probabilities(c: &mut Criterion) {
    let entries = make_entries(1_000);
    c.bench_function("selection_probabilities_1000", |b| {
        b.iter(|| selection_probabilities(black_box(&entries)))
    });
}

criterion_group!(benches, bench_sample, bench_probabilities);
criterion_main!(benches);
