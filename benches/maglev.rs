use criterion::{criterion_group, criterion_main, Criterion};
use maglev_table::{Maglev, Permutation};
use rand::Rng;

fn permutation_generate(c: &mut Criterion) {
    for (node_count, table_size) in [(100, 1_009), (1_000, 10_007)] {
        c.bench_function(
            &format!("permutation generate (N={node_count}, M={table_size})"),
            |b| {
                b.iter(|| Permutation::generate(node_count, table_size));
            },
        );
    }
}

fn table_build(c: &mut Criterion) {
    for (node_count, table_size) in [(100, 1_009), (1_000, 65_537), (4_096, 4_099)] {
        let maglev = Maglev::new(node_count, table_size).unwrap();

        c.bench_function(
            &format!("table build (N={node_count}, M={table_size})"),
            |b| {
                b.iter(|| maglev.build().unwrap());
            },
        );

        maglev.down(node_count / 2).unwrap();

        c.bench_function(
            &format!("table rebuild, one node down (N={node_count}, M={table_size})"),
            |b| {
                b.iter(|| maglev.build().unwrap());
            },
        );
    }
}

fn table_lookup(c: &mut Criterion) {
    let maglev = Maglev::new(1_000, 65_537).unwrap();
    maglev.build().unwrap();

    let mut rng = rand::rng();

    c.bench_function("lookup key", |b| {
        b.iter(|| {
            let key = rng.random::<u64>().to_be_bytes();
            assert!(maglev.lookup(key).is_some());
        });
    });

    c.bench_function("lookup hash", |b| {
        b.iter(|| {
            assert!(maglev.lookup_hash(rng.random()).is_some());
        });
    });

    let table = maglev.table();

    c.bench_function("lookup hash, pinned table", |b| {
        b.iter(|| {
            assert!(table.route(rng.random()).is_some());
        });
    });
}

criterion_group!(benches, permutation_generate, table_build, table_lookup);
criterion_main!(benches);
