//! Benchmarks for distribution evaluation, sampling and estimation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uqcore::prelude::*;

fn bench_pdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("PDF");

    for dimension in [1usize, 2, 5, 10] {
        let normal = Normal::standard(dimension);
        let x = Point::filled(dimension, 0.3);
        group.bench_with_input(BenchmarkId::new("Normal", dimension), &x, |b, x| {
            b.iter(|| normal.compute_pdf(black_box(x)).unwrap());
        });
    }

    let dirichlet = Dirichlet::new(Point::from_vec(vec![2.0, 3.0, 4.0])).unwrap();
    let x = Point::from_vec(vec![0.2, 0.3]);
    group.bench_function("Dirichlet", |b| {
        b.iter(|| dirichlet.compute_pdf(black_box(&x)).unwrap());
    });

    group.finish();
}

fn bench_cdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("CDF");

    let gamma = Gamma::new(2.5, 1.0, 0.0).unwrap();
    group.bench_function("Gamma_closed_form", |b| {
        b.iter(|| gamma.compute_cdf(black_box(&Point::scalar(2.0))).unwrap());
    });

    // two components use the bivariate normal CDF, three integrate numerically
    for dimension in [2usize, 3] {
        let rows: Vec<Vec<f64>> = (0..dimension)
            .map(|i| (0..dimension).map(|j| if i == j { 1.0 } else { 0.3 }).collect())
            .collect();
        let copula = NormalCopula::new(CovarianceMatrix::from_rows(&rows).unwrap()).unwrap();
        let u = Point::filled(dimension, 0.4);
        group.bench_with_input(BenchmarkId::new("NormalCopula", dimension), &u, |b, u| {
            b.iter(|| copula.compute_cdf(black_box(u)).unwrap());
        });
    }

    group.finish();
}

fn bench_quantile(c: &mut Criterion) {
    let mut group = c.benchmark_group("Quantile");

    let lognormal = LogNormal::new(0.0, 0.5, 0.0).unwrap();
    group.bench_function("LogNormal", |b| {
        b.iter(|| lognormal.compute_scalar_quantile(black_box(0.9)).unwrap());
    });

    let binomial = Binomial::new(50, 0.3).unwrap();
    group.bench_function("Binomial", |b| {
        b.iter(|| binomial.compute_scalar_quantile(black_box(0.9)).unwrap());
    });

    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sampling");

    for size in [100usize, 1000, 10_000] {
        let gamma = Gamma::new(0.7, 1.0, 0.0).unwrap();
        group.bench_with_input(BenchmarkId::new("Gamma", size), &size, |b, &size| {
            let mut rng = RandomGenerator::with_seed(1);
            b.iter(|| gamma.get_sample(size, &mut rng).unwrap());
        });
    }

    group.finish();
}

fn bench_factories(c: &mut Criterion) {
    let mut group = c.benchmark_group("Factory");

    let mut rng = RandomGenerator::with_seed(2);
    let skewed = Gamma::new(3.0, 2.0, 0.0)
        .unwrap()
        .get_sample(1000, &mut rng)
        .unwrap();
    let symmetric = Normal::new(1.0, 2.0)
        .unwrap()
        .get_sample(1000, &mut rng)
        .unwrap();
    let simplex = Dirichlet::new(Point::from_vec(vec![2.0, 3.0, 5.0]))
        .unwrap()
        .get_sample(1000, &mut rng)
        .unwrap();

    let registry = FactoryRegistry::with_defaults();
    for (name, sample) in [
        ("Normal", &symmetric),
        ("TruncatedNormal", &symmetric),
        ("LogNormal", &skewed),
        ("Gamma", &skewed),
    ] {
        let factory = registry.get_by_name(name).unwrap();
        group.bench_with_input(BenchmarkId::new("build", name), sample, |b, sample| {
            b.iter(|| factory.build(sample).unwrap());
        });
    }
    group.bench_function("build/Dirichlet", |b| {
        let factory = DirichletFactory::default();
        b.iter(|| factory.build(&simplex).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pdf,
    bench_cdf,
    bench_quantile,
    bench_sampling,
    bench_factories
);
criterion_main!(benches);
