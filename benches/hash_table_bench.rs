use chained_hashmap::{Cursor, HashTable};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (HashTable<String, u64>, Vec<String>) {
    let mut t = HashTable::new();
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        t.insert(k.clone(), i as u64).unwrap();
    }
    (t, keys)
}

// 10k pseudo-random picks out of `n`.
fn picks(n: usize) -> impl Iterator<Item = usize> {
    let mut s = 0x9e3779b97f4a7c15u64;
    std::iter::repeat_with(move || {
        s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
        (s as usize) % n
    })
    .take(10_000)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("table::insert_fresh_100k", |b| {
        b.iter_batched(
            HashTable::<String, u64>::new,
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("table::insert_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut t = HashTable::<String, u64>::new();
                t.reserve(100_000);
                t
            },
            |mut t| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    let _ = t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("table::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (t, keys) = filled(5, 110_000);
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                for i in picks(keys.len()) {
                    sel.insert(i);
                }
                let to_erase: Vec<Cursor> = sel.into_iter().map(|i| t.find(&keys[i])).collect();
                (t, to_erase)
            },
            |(mut t, to_erase)| {
                for c in to_erase {
                    let _ = t.erase(c);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("table::find_hit_10k_on_100k", |b| {
        let (t, keys) = filled(7, 100_000);
        let queries: Vec<String> = picks(keys.len()).map(|i| keys[i].clone()).collect();
        b.iter(|| {
            for k in &queries {
                black_box(t.find(k));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("table::find_miss_10k_on_100k", |b| {
        let (t, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(t.find(&k));
            }
        })
    });
}

fn bench_rehash_100k(c: &mut Criterion) {
    c.bench_function("table::rehash_grow_100k", |b| {
        b.iter_batched(
            || filled(13, 100_000).0,
            |mut t| {
                let n = t.bucket_count();
                t.rehash(n * 4);
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_and_walk(c: &mut Criterion) {
    c.bench_function("table::iter_all_100k", |b| {
        let (t, _) = filled(999, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in t.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("table::cursor_walk_100k", |b| {
        let (t, _) = filled(1000, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            let mut c = t.begin();
            while let Some(v) = c.value(&t) {
                sum = sum.wrapping_add(*v);
                c = c.next(&t);
            }
            black_box(sum)
        })
    });

    c.bench_function("table::iter_mut_increment_all_100k", |b| {
        b.iter_batched(
            || filled(1001, 100_000).0,
            |mut t| {
                for (_k, v) in t.iter_mut() {
                    *v = v.wrapping_add(1);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_insert_reserved_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_erase_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_rehash_100k,
              bench_iter_and_walk
}
criterion_main!(benches_insert, benches_ops);
