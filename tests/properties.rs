use proptest::prelude::*;
use uqcore::prelude::*;

fn cdf_at_quantile(distribution: &Distribution, p: f64) -> f64 {
    let x = distribution.compute_quantile(p).unwrap();
    distribution.compute_cdf(&x).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // --- quantile inverts the CDF ---

    #[test]
    fn normal_quantile_roundtrip(
        mu in -10.0_f64..10.0,
        sigma in 0.1_f64..10.0,
        p in 0.001_f64..0.999,
    ) {
        let normal = Distribution::from(Normal::new(mu, sigma).unwrap());
        let p_back = cdf_at_quantile(&normal, p);
        prop_assert!((p_back - p).abs() < 1e-6, "p={p} -> p_back={p_back}");
    }

    #[test]
    fn gamma_quantile_roundtrip(
        k in 0.5_f64..20.0,
        lambda in 0.1_f64..5.0,
        gamma in -5.0_f64..5.0,
        p in 0.01_f64..0.99,
    ) {
        let distribution = Distribution::from(Gamma::new(k, lambda, gamma).unwrap());
        let p_back = cdf_at_quantile(&distribution, p);
        prop_assert!((p_back - p).abs() < 1e-6, "p={p} -> p_back={p_back}");
    }

    #[test]
    fn lognormal_quantile_roundtrip(
        mu_log in -2.0_f64..2.0,
        sigma_log in 0.1_f64..1.5,
        p in 0.001_f64..0.999,
    ) {
        let distribution = Distribution::from(LogNormal::new(mu_log, sigma_log, 0.0).unwrap());
        let p_back = cdf_at_quantile(&distribution, p);
        prop_assert!((p_back - p).abs() < 1e-6, "p={p} -> p_back={p_back}");
    }

    #[test]
    fn uniform_and_exponential_quantile_roundtrip(
        a in -50.0_f64..0.0,
        width in 0.5_f64..50.0,
        lambda in 0.1_f64..10.0,
        p in 0.0_f64..1.0,
    ) {
        let uniform = Distribution::from(Uniform::new(a, a + width).unwrap());
        let exponential = Distribution::from(Exponential::new(lambda, a).unwrap());
        prop_assert!((cdf_at_quantile(&uniform, p) - p).abs() < 1e-9);
        prop_assert!((cdf_at_quantile(&exponential, p) - p).abs() < 1e-9);
    }

    #[test]
    fn truncated_normal_quantile_stays_in_bounds(
        mu in -1.0_f64..1.0,
        sigma in 0.5_f64..3.0,
        a in -2.0_f64..-0.5,
        width in 0.5_f64..4.0,
        p in 0.0_f64..=1.0,
    ) {
        let truncated = TruncatedNormal::new(mu, sigma, a, a + width).unwrap();
        let x = truncated.compute_scalar_quantile(p).unwrap();
        prop_assert!(x >= a - 1e-12 && x <= a + width + 1e-12, "x={x}");
    }

    #[test]
    fn truncated_normal_tail_quantile_roundtrip(
        offset in 3.0_f64..8.0,
        width in 0.2_f64..2.0,
        mirrored in any::<bool>(),
        p in 0.001_f64..0.999,
    ) {
        // intervals far in either tail of N(0, 1)
        let (a, b) = if mirrored { (-offset - width, -offset) } else { (offset, offset + width) };
        let truncated = Distribution::from(TruncatedNormal::new(0.0, 1.0, a, b).unwrap());
        let p_back = cdf_at_quantile(&truncated, p);
        prop_assert!((p_back - p).abs() < 1e-6, "[{a}, {b}] p={p} -> p_back={p_back}");
    }

    #[test]
    fn cdf_is_a_probability(
        mu in -5.0_f64..5.0,
        sigma in 0.1_f64..5.0,
        x in -50.0_f64..50.0,
    ) {
        let normal = Normal::new(mu, sigma).unwrap();
        let c = normal.compute_cdf(&Point::scalar(x)).unwrap();
        prop_assert!((0.0..=1.0).contains(&c));
    }

    // --- container invariants ---

    #[test]
    fn sample_mean_within_extremes(values in prop::collection::vec(-1e3_f64..1e3, 1..50)) {
        let sample = Sample::from_scalars(&values);
        let mean = sample.compute_mean().unwrap()[0];
        let min = sample.min().unwrap()[0];
        let max = sample.max().unwrap()[0];
        prop_assert!(mean >= min - 1e-9 && mean <= max + 1e-9);
    }

    #[test]
    fn ranks_are_a_permutation_for_distinct_values(
        values in prop::collection::btree_set(-1000_i32..1000, 1..40),
        seed in any::<u64>(),
    ) {
        let sorted: Vec<f64> = values.into_iter().map(f64::from).collect();
        let mut rng = RandomGenerator::with_seed(seed);
        let values: Vec<f64> = rng
            .permutation(sorted.len())
            .into_iter()
            .map(|i| sorted[i])
            .collect();
        let mut ranks = Sample::from_scalars(&values).rank().column(0);
        ranks.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        prop_assert_eq!(ranks, expected);
    }

    #[test]
    fn covariance_is_symmetric(rows in prop::collection::vec(prop::collection::vec(-10.0_f64..10.0, 3), 2..30)) {
        let sample = Sample::from_rows(&rows).unwrap();
        let covariance = sample.compute_covariance().unwrap();
        for i in 0..3 {
            prop_assert!(covariance.get(i, i) >= 0.0);
            for j in 0..3 {
                prop_assert_eq!(covariance.get(i, j), covariance.get(j, i));
            }
        }
    }

    // --- experiments ---

    #[test]
    fn composite_geometry(
        dimension in 1_usize..6,
        levels in prop::collection::vec(0.1_f64..10.0, 1..4),
    ) {
        let design = Composite::centered(dimension, Point::from_vec(levels.clone())).unwrap();
        let sample = design.generate().unwrap();
        prop_assert_eq!(sample.size(), 2 * dimension * levels.len());
        for (index, point) in sample.points().enumerate() {
            let axis = index / (2 * levels.len());
            let level = levels[(index / 2) % levels.len()];
            let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
            for (j, x) in point.iter().enumerate() {
                let expected = if j == axis { sign * level } else { 0.0 };
                prop_assert_eq!(*x, expected);
            }
        }
    }

    #[test]
    fn bootstrap_draws_from_reference(
        values in prop::collection::vec(-100.0_f64..100.0, 1..30),
        seed in any::<u64>(),
    ) {
        let bootstrap = Bootstrap::new(Sample::from_scalars(&values)).unwrap();
        let mut rng = RandomGenerator::with_seed(seed);
        let resample = bootstrap.generate_from(&mut rng).unwrap();
        prop_assert_eq!(resample.size(), values.len());
        for x in resample.column(0) {
            prop_assert!(values.contains(&x));
        }
    }
}
