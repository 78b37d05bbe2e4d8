//! Criterion benchmarks for the cutoff search, KS distance and bootstrap.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pl_core::{
    bootstrap, estimate_parameters, estimate_parameters_with, ks_test, BootstrapConfig, Family,
    FitConfig, PowerLaw, Univariate,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn draw(law: &PowerLaw, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| law.sample(&mut rng)).collect()
}

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");
    group.sample_size(20);

    for family in [Family::Continuous, Family::Discrete] {
        let law = PowerLaw::new(family, 2.5, 1.0).unwrap();
        for n in [200usize, 2_000] {
            let data = draw(&law, n, 7);
            group.bench_with_input(BenchmarkId::new(family.to_string(), n), &data, |b, data| {
                b.iter(|| black_box(estimate_parameters(black_box(data), family, None, 1e5)));
            });
        }
    }

    let law = PowerLaw::continuous(2.5, 1.0).unwrap();
    let data = draw(&law, 5_000, 8);
    let parallel = FitConfig::default().with_parallel(true);
    group.bench_with_input(BenchmarkId::new("continuous_parallel", 5_000), &data, |b, data| {
        b.iter(|| {
            black_box(estimate_parameters_with(
                black_box(data),
                Family::Continuous,
                None,
                &parallel,
            ))
        });
    });

    group.finish();
}

fn bench_ks(c: &mut Criterion) {
    let mut group = c.benchmark_group("ks");

    for family in [Family::Continuous, Family::Discrete] {
        let law = PowerLaw::new(family, 2.2, 1.0).unwrap();
        let data = draw(&law, 10_000, 9);
        group.bench_with_input(BenchmarkId::new("ks_test", family), &data, |b, data| {
            b.iter(|| black_box(ks_test(black_box(data), &law, 1.0, 1e5)));
        });
    }

    group.finish();
}

fn bench_bootstrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap");
    group.sample_size(10);

    let law = PowerLaw::discrete(2.5, 1.0).unwrap();
    let data = draw(&law, 300, 10);
    for parallel in [false, true] {
        let config = BootstrapConfig::default().with_sims(10).with_parallel(parallel);
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::new(label, 10), &config, |b, config| {
            b.iter(|| black_box(bootstrap(black_box(&data), &law, config)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_estimate, bench_ks, bench_bootstrap);
criterion_main!(benches);
