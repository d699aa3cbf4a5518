use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ec_search::instance::rand as rand_inst;
use ec_search::{search, SearchOptions};

fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("Variants");

    for &(m, n) in &[(10usize, 12usize), (12, 16), (14, 20)] {
        let mut rng = StdRng::seed_from_u64(42);
        let inst = rand_inst::generate(m, n, 0.3, true, &mut rng)
            .expect("failed to generate a bench instance");
        let label = format!("{m}x{n}");

        group.bench_with_input(BenchmarkId::new("Base", &label), &inst.matrix, |b, matrix| {
            b.iter(|| search(black_box(matrix), &SearchOptions::default()))
        });
        group.bench_with_input(BenchmarkId::new("Plus", &label), &inst.matrix, |b, matrix| {
            b.iter(|| {
                search(
                    black_box(matrix),
                    &SearchOptions {
                        plus: true,
                        ..SearchOptions::default()
                    },
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_variants);
criterion_main!(benches);
