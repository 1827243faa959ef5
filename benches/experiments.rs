//! Benchmarks for experiment generation and normality tests.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use uqcore::prelude::*;

fn bench_stratified(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stratified");
    let levels = Point::from_vec(vec![0.5, 1.0, 2.0]);

    for dimension in [2usize, 8, 32] {
        let composite = Composite::centered(dimension, levels.clone()).unwrap();
        group.bench_with_input(
            BenchmarkId::new("Composite", dimension),
            &composite,
            |b, composite| {
                b.iter(|| composite.generate().unwrap());
            },
        );
    }

    for dimension in [2usize, 6, 10] {
        let factorial = Factorial::centered(dimension, levels.clone()).unwrap();
        group.bench_with_input(
            BenchmarkId::new("Factorial", dimension),
            &factorial,
            |b, factorial| {
                b.iter(|| factorial.generate().unwrap());
            },
        );
    }

    group.finish();
}

fn bench_random_experiments(c: &mut Criterion) {
    let mut group = c.benchmark_group("Random");

    for size in [100usize, 1000] {
        let mut rng = RandomGenerator::with_seed(3);
        let reference = Normal::standard(3).get_sample(size, &mut rng).unwrap();
        let experiments = [
            Experiment::from(Bootstrap::new(reference).unwrap()),
            Experiment::from(MonteCarloExperiment::new(Normal::standard(3), size).unwrap()),
            Experiment::from(LHSExperiment::new(Normal::standard(3), size).unwrap()),
            Experiment::from(
                ImportanceSamplingExperiment::new(
                    Normal::standard(3),
                    Normal::multivariate(
                        Point::new(3),
                        Point::filled(3, 2.0),
                        CovarianceMatrix::identity(3),
                    )
                    .unwrap(),
                    size,
                )
                .unwrap(),
            ),
        ];
        for experiment in experiments {
            group.bench_with_input(
                BenchmarkId::new(experiment.class_name(), size),
                &experiment,
                |b, experiment| {
                    b.iter(|| experiment.generate_with_weights_from(&mut rng).unwrap());
                },
            );
        }
    }

    group.finish();
}

fn bench_normality_tests(c: &mut Criterion) {
    let mut group = c.benchmark_group("NormalityTest");

    for size in [100usize, 1000, 10_000] {
        let mut rng = RandomGenerator::with_seed(4);
        let sample = Normal::standard(1).get_sample(size, &mut rng).unwrap();
        group.bench_with_input(
            BenchmarkId::new("AndersonDarling", size),
            &sample,
            |b, sample| {
                b.iter(|| NormalityTest::anderson_darling_normal(sample, 0.95).unwrap());
            },
        );
        group.bench_with_input(
            BenchmarkId::new("CramerVonMises", size),
            &sample,
            |b, sample| {
                b.iter(|| NormalityTest::cramer_von_mises_normal(sample, 0.95).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_stratified,
    bench_random_experiments,
    bench_normality_tests
);
criterion_main!(benches);
