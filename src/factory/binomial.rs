use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{debug, warn};

use super::{
    described, load_settings, require_univariate, DistributionFactoryImplementation,
};
use crate::config::NumericalSettings;
use crate::distribution::{Binomial, Distribution};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::special::ln_gamma;
use crate::types::{Point, Sample};

/// Maximum likelihood for [`Binomial`].
///
/// For a fixed `n` the likelihood is maximal at `p = mean/n`, so the
/// estimator walks `n` from its moment estimate `mean²/(mean - var)` (at
/// least the sample maximum) in the direction that increases the
/// log-likelihood, and stops at the first decrease.
#[derive(Debug, Clone, Default)]
pub struct BinomialFactory {
    settings: NumericalSettings,
}

/// `x · ln y` with the convention `0 · ln 0 = 0`.
fn x_log_y(x: f64, log_y: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x * log_y
    }
}

/// Log-likelihood of counts `k ↦ multiplicity` under `Binomial(n, mean/n)`.
fn log_likelihood(counts: &BTreeMap<u64, usize>, n: u64, mean: f64) -> f64 {
    let nf = n as f64;
    let p = mean / nf;
    let (log_p, log_q) = (p.ln(), (-p).ln_1p());
    let log_n_factorial = ln_gamma(nf + 1.0);
    counts
        .iter()
        .map(|(&k, &multiplicity)| {
            let kf = k as f64;
            multiplicity as f64
                * (log_n_factorial - ln_gamma(kf + 1.0) - ln_gamma(nf - kf + 1.0)
                    + x_log_y(kf, log_p)
                    + x_log_y(nf - kf, log_q))
        })
        .sum()
}

impl BinomialFactory {
    /// Fit a binomial distribution to non-negative integer observations.
    ///
    /// An all-zero sample gives `Binomial(1, 0)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty or non-univariate sample or a
    /// value that is not a non-negative integer.
    pub fn build_as_binomial(&self, sample: &Sample) -> Result<Binomial> {
        require_univariate(sample, 1, "Binomial")?;
        let epsilon = self.settings.support_epsilon;
        let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
        for x in sample.column(0) {
            let k = x.round();
            if !((x - k).abs() <= epsilon && k >= 0.0 && k <= f64::from(u32::MAX)) {
                return Err(Error::invalid_argument(format!(
                    "can build a Binomial distribution only from non-negative integers, got {x}"
                )));
            }
            *counts.entry(k as u64).or_insert(0) += 1;
        }
        let size = sample.size() as f64;
        let mean = counts.iter().map(|(&k, &m)| k as f64 * m as f64).sum::<f64>() / size;
        let upper_bound = counts.keys().next_back().copied().unwrap_or(0);
        if upper_bound == 0 {
            warn!("Binomial estimation on an all-zero sample, returning Binomial(1, 0)");
            return described(Binomial::new(1, 0.0)?, sample);
        }
        let variance = counts
            .iter()
            .map(|(&k, &m)| m as f64 * (k as f64 - mean).powi(2))
            .sum::<f64>()
            / size;

        let mut n = upper_bound;
        if mean > variance {
            let moment_estimate = (mean * mean / (mean - variance)).round();
            if moment_estimate > upper_bound as f64 && moment_estimate <= f64::from(u32::MAX) {
                n = moment_estimate as u64;
            }
        }
        let mut best_n = n;
        let mut best = log_likelihood(&counts, n, mean);
        // walk down if that improves, otherwise up; never below the maximum
        let downward = n > upper_bound && log_likelihood(&counts, n - 1, mean) > best;
        loop {
            let candidate = if downward {
                if best_n == upper_bound {
                    break;
                }
                best_n - 1
            } else {
                best_n + 1
            };
            let value = log_likelihood(&counts, candidate, mean);
            if value.partial_cmp(&best) != Some(Ordering::Greater) {
                break;
            }
            best_n = candidate;
            best = value;
        }
        debug!("Binomial maximum likelihood: n = {best_n}, log-likelihood {best}");
        described(Binomial::new(best_n, mean / best_n as f64)?, sample)
    }

    /// Build from `[n, p]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless `n` is a non-negative integer and
    /// `p ∈ [0, 1]`.
    pub fn build_as_binomial_from_parameters(&self, parameter: &Point) -> Result<Binomial> {
        Binomial::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for BinomialFactory {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn DistributionFactoryImplementation> {
        Box::new(self.clone())
    }

    fn settings(&self) -> &NumericalSettings {
        &self.settings
    }

    fn set_settings(&mut self, settings: NumericalSettings) {
        self.settings = settings;
    }

    fn build(&self, sample: &Sample) -> Result<Distribution> {
        self.build_as_binomial(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_binomial_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(Binomial::default())
    }
}

impl PersistentObject for BinomialFactory {
    const CLASS_NAME: &'static str = "BinomialFactory";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionFactoryImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        Ok(Self {
            settings: load_settings(advocate, Self::CLASS_NAME)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionImplementation;
    use crate::random::RandomGenerator;

    #[test]
    fn test_consistency() {
        let source = Binomial::new(15, 0.3).unwrap();
        let mut rng = RandomGenerator::with_seed(12);
        let sample = source.get_sample(10_000, &mut rng).unwrap();
        let fitted = BinomialFactory::default().build_as_binomial(&sample).unwrap();
        let mean = sample.compute_mean().unwrap()[0];
        assert!((fitted.n() as f64 * fitted.p() - mean).abs() < 1e-12);
        assert!(fitted.n() >= 12 && fitted.n() <= 19, "n = {}", fitted.n());
    }

    #[test]
    fn test_estimate_is_a_local_maximum() {
        let sample = Sample::from_scalars(&[3.0, 5.0, 4.0, 6.0, 2.0, 5.0, 4.0, 7.0]);
        let fitted = BinomialFactory::default().build_as_binomial(&sample).unwrap();
        let mut counts = BTreeMap::new();
        for x in sample.column(0) {
            *counts.entry(x as u64).or_insert(0) += 1;
        }
        let mean = 4.5;
        let best = log_likelihood(&counts, fitted.n(), mean);
        assert!(fitted.n() >= 7);
        assert!(log_likelihood(&counts, fitted.n() + 1, mean) <= best);
        if fitted.n() > 7 {
            assert!(log_likelihood(&counts, fitted.n() - 1, mean) <= best);
        }
    }

    #[test]
    fn test_constant_sample() {
        let fitted = BinomialFactory::default()
            .build_as_binomial(&Sample::from_scalars(&[3.0, 3.0, 3.0, 3.0]))
            .unwrap();
        assert_eq!(fitted.n(), 3);
        assert_eq!(fitted.p(), 1.0);
        let mut counts = BTreeMap::new();
        counts.insert(3, 4);
        assert_eq!(log_likelihood(&counts, 3, 3.0), 0.0);
        assert!(log_likelihood(&counts, 4, 3.0) < 0.0);
    }

    #[test]
    fn test_all_zero_sample() {
        let fitted = BinomialFactory::default()
            .build_as_binomial(&Sample::from_scalars(&[0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(fitted.n(), 1);
        assert_eq!(fitted.p(), 0.0);
    }

    #[test]
    fn test_rejects_non_integers() {
        let factory = BinomialFactory::default();
        assert!(factory.build(&Sample::from_scalars(&[1.0, 2.5])).is_err());
        assert!(factory.build(&Sample::from_scalars(&[1.0, -1.0])).is_err());
        assert!(factory.build(&Sample::empty(1)).is_err());
    }
}
