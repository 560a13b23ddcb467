use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use multiway::BTree;
use std::collections::BTreeMap;

const N: usize = 10_000;

/// Minimum degrees compared in every group; 6 matches `BTreeMap`'s node width.
const DEGREES: [usize; 3] = [2, 6, 32];

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Simple LCG for a deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn build(min_degree: usize, keys: &[i64]) -> BTree<i64, i64> {
    let mut tree = BTree::new(min_degree).unwrap();
    for &k in keys {
        tree.insert(k, k).unwrap();
    }
    tree
}

fn bench_insert(c: &mut Criterion, name: &str, keys: &[i64]) {
    let mut group = c.benchmark_group(name);

    for t in DEGREES {
        group.bench_with_input(BenchmarkId::new("BTree", t), &t, |b, &t| {
            b.iter(|| build(t, keys));
        });
    }

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| keys.iter().map(|&k| (k, k)).collect::<BTreeMap<i64, i64>>());
    });

    group.finish();
}

fn bench_insert_ordered(c: &mut Criterion) {
    bench_insert(c, "insert_ordered", &ordered_keys(N));
}

fn bench_insert_random(c: &mut Criterion) {
    bench_insert(c, "insert_random", &random_keys(N));
}

fn bench_get_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("get_random");

    for t in DEGREES {
        let tree = build(t, &keys);
        group.bench_with_input(BenchmarkId::new("BTree", t), &tree, |b, tree| {
            b.iter(|| {
                let mut sum = 0i64;
                for k in &keys {
                    if let Some(&v) = tree.get(k) {
                        sum = sum.wrapping_add(v);
                    }
                }
                sum
            });
        });
    }

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for k in &keys {
                if let Some(&v) = bt_map.get(k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

fn bench_delete_random(c: &mut Criterion) {
    let keys = random_keys(N);

    let mut group = c.benchmark_group("delete_random");

    for t in DEGREES {
        group.bench_with_input(BenchmarkId::new("BTree", t), &t, |b, &t| {
            b.iter_batched(
                || build(t, &keys),
                |mut tree| {
                    for k in &keys {
                        let _ = tree.delete(k);
                    }
                    tree
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || keys.iter().map(|&k| (k, k)).collect::<BTreeMap<i64, i64>>(),
            |mut map| {
                for k in &keys {
                    map.remove(k);
                }
                map
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_range_query(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("range_query_100");

    for t in DEGREES {
        let tree = build(t, &keys);
        group.bench_with_input(BenchmarkId::new("BTree", t), &tree, |b, tree| {
            b.iter(|| {
                (0..N as i64)
                    .step_by(100)
                    .map(|start| tree.range_query(&start, &(start + 99), 100).len())
                    .sum::<usize>()
            });
        });
    }

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            (0..N as i64)
                .step_by(100)
                .map(|start| bt_map.range(start..=start + 99).take(100).count())
                .sum::<usize>()
        });
    });

    group.finish();
}

criterion_group!(insert_benches, bench_insert_ordered, bench_insert_random);

criterion_group!(lookup_benches, bench_get_random, bench_range_query);

criterion_group!(delete_benches, bench_delete_random);

criterion_main!(insert_benches, lookup_benches, delete_benches);
