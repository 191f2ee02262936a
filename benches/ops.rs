use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cedrus::Trie;

// ── Key generation ──────────────────────────────────────────────────────────

fn random_keys(n: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = std::collections::BTreeSet::new();
    while set.len() < n {
        let len = rng.gen_range(2..=12);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect();
        set.insert(key);
    }
    set.into_iter().collect()
}

fn build_trie(keys: &[Vec<u8>]) -> Trie {
    let mut trie = Trie::new();
    for (i, key) in keys.iter().enumerate() {
        trie.insert(key, i as i32).unwrap();
    }
    trie
}

// ── Benchmarks ──────────────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion) {
    let keys = random_keys(10_000, 42);
    c.bench_function("insert_10k", |b| {
        b.iter(|| build_trie(black_box(&keys)));
    });

    let keys_unordered = random_keys(10_000, 43);
    c.bench_function("insert_10k_unordered", |b| {
        b.iter(|| {
            let mut trie = Trie::builder().ordered(false).build();
            for (i, key) in black_box(&keys_unordered).iter().enumerate() {
                trie.insert(key, i as i32).unwrap();
            }
            trie
        });
    });
}

fn bench_lookup(c: &mut Criterion) {
    let keys = random_keys(50_000, 42);
    let trie = build_trie(&keys);

    let mut rng = StdRng::seed_from_u64(123);
    let hits: Vec<&Vec<u8>> = (0..1000)
        .map(|_| &keys[rng.gen_range(0..keys.len())])
        .collect();
    // Uppercase keys are guaranteed absent.
    let misses: Vec<Vec<u8>> = (0..1000)
        .map(|_| {
            let len = rng.gen_range(2..=12);
            (0..len).map(|_| rng.gen_range(b'A'..=b'Z')).collect()
        })
        .collect();

    c.bench_function("lookup_hit_1k", |b| {
        b.iter(|| {
            for key in &hits {
                black_box(trie.get(black_box(key)));
            }
        });
    });

    c.bench_function("lookup_miss_1k", |b| {
        b.iter(|| {
            for key in &misses {
                black_box(trie.get(black_box(key)));
            }
        });
    });
}

fn bench_prefix_match(c: &mut Criterion) {
    let keys = random_keys(50_000, 42);
    let trie = build_trie(&keys);

    // A long lowercase text scanned from every offset, the lattice-building
    // access pattern of tokenizers.
    let mut rng = StdRng::seed_from_u64(999);
    let text: Vec<u8> = (0..200).map(|_| rng.gen_range(b'a'..=b'z')).collect();

    c.bench_function("prefix_match_scan", |b| {
        b.iter(|| {
            for offset in 0..text.len() {
                let ids: Vec<i32> = trie.prefix_match(black_box(&text[offset..]), 0).collect();
                black_box(&ids);
            }
        });
    });
}

fn bench_prefix_predict(c: &mut Criterion) {
    let keys = random_keys(50_000, 42);
    let trie = build_trie(&keys);

    let mut rng = StdRng::seed_from_u64(777);
    let prefixes: Vec<Vec<u8>> = (0..100)
        .map(|_| (0..2).map(|_| rng.gen_range(b'a'..=b'z')).collect())
        .collect();

    c.bench_function("prefix_predict_2byte", |b| {
        b.iter(|| {
            for prefix in &prefixes {
                let ids: Vec<i32> = trie.prefix_predict(black_box(prefix), 0).collect();
                black_box(&ids);
            }
        });
    });
}

fn bench_churn(c: &mut Criterion) {
    let keys = random_keys(10_000, 42);

    c.bench_function("delete_reinsert_1k", |b| {
        let mut trie = build_trie(&keys);
        b.iter(|| {
            for (i, key) in keys.iter().take(1000).enumerate() {
                trie.delete(black_box(key)).unwrap();
                trie.insert(black_box(key), i as i32).unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_lookup,
    bench_prefix_match,
    bench_prefix_predict,
    bench_churn,
);
criterion_main!(benches);
