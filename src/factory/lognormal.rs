use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{
    described, load_settings, require_finite_sample, require_univariate, scalar_moments,
    DistributionFactoryImplementation,
};
use crate::algo::Brent;
use crate::config::NumericalSettings;
use crate::distribution::{Distribution, LogNormal};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::special::standard_normal_quantile;
use crate::types::{Point, Sample};

/// Doublings tried when bracketing a root.
const MAX_BRACKET_STEPS: usize = 64;

/// Estimator used by [`LogNormalFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogNormalEstimationMethod {
    /// Local maximum of the likelihood profiled over `γ`; falls back to
    /// modified moments when the likelihood has no interior maximum.
    LocalLikelihoodMaximization,
    /// Mean, variance and skewness.
    #[default]
    Moments,
    /// Mean, variance and the sample minimum (Cohen and Whitten).
    ModifiedMoments,
}

impl fmt::Display for LogNormalEstimationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LocalLikelihoodMaximization => "LocalLikelihoodMaximization",
            Self::Moments => "Moments",
            Self::ModifiedMoments => "ModifiedMoments",
        };
        f.write_str(name)
    }
}

/// Estimation of the three-parameter [`LogNormal`].
///
/// | Method | Equations |
/// |--------|-----------|
/// | moments | mean, variance, skewness `(ω + 2)·√(ω - 1)` with `ω = exp(σ_log²)` |
/// | modified moments | mean, variance, `E[X₍₁₎] ≈ γ + exp(μ_log + σ_log·Φ⁻¹(1/(n+1)))` |
/// | local likelihood | `∂ℓ/∂γ = 0` with `μ_log`, `σ_log` the log-sample moments |
///
/// [`DistributionFactoryImplementation::build`] uses the method the factory
/// was configured with, [`LogNormalEstimationMethod::Moments`] by default.
#[derive(Debug, Clone, Default)]
pub struct LogNormalFactory {
    settings: NumericalSettings,
    method: LogNormalEstimationMethod,
}

/// Log-sample mean and biased variance of `x - γ`.
fn log_moments(values: &[f64], gamma: f64) -> (f64, f64) {
    let n = values.len() as f64;
    let mu = values.iter().map(|x| (x - gamma).ln()).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|x| ((x - gamma).ln() - mu).powi(2))
        .sum::<f64>()
        / n;
    (mu, variance)
}

/// Derivative of the profile log-likelihood with respect to `γ`:
/// `Σ (σ² + y_i - μ) / (x_i - γ)` with `y_i = ln(x_i - γ)`.
fn likelihood_score(values: &[f64], gamma: f64) -> f64 {
    let (mu, variance) = log_moments(values, gamma);
    values
        .iter()
        .map(|x| (variance + (x - gamma).ln() - mu) / (x - gamma))
        .sum()
}

impl LogNormalFactory {
    /// A factory using `method`.
    #[must_use]
    pub fn with_method(method: LogNormalEstimationMethod) -> Self {
        Self {
            settings: NumericalSettings::default(),
            method,
        }
    }

    /// The configured estimator.
    #[must_use]
    pub fn method(&self) -> LogNormalEstimationMethod {
        self.method
    }

    /// Replace the estimator.
    pub fn set_method(&mut self, method: LogNormalEstimationMethod) {
        self.method = method;
    }

    /// Fit a three-parameter log-normal distribution with the configured
    /// method.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate sample, fewer than three
    /// points or a sample without positive skewness.
    pub fn build_as_lognormal(&self, sample: &Sample) -> Result<LogNormal> {
        self.build_as_lognormal_with(sample, self.method)
    }

    /// Fit a three-parameter log-normal distribution with `method`.
    ///
    /// # Errors
    ///
    /// Same as [`LogNormalFactory::build_as_lognormal`].
    pub fn build_as_lognormal_with(
        &self,
        sample: &Sample,
        method: LogNormalEstimationMethod,
    ) -> Result<LogNormal> {
        match method {
            LogNormalEstimationMethod::Moments => self.build_method_of_moments(sample),
            LogNormalEstimationMethod::ModifiedMoments => {
                self.build_method_of_modified_moments(sample)
            }
            LogNormalEstimationMethod::LocalLikelihoodMaximization => {
                match self.build_method_of_local_likelihood_maximization(sample) {
                    Err(Error::NumericalConvergence { message, .. }) => {
                        warn!(
                            "LogNormal likelihood maximization failed ({message}), using modified moments"
                        );
                        self.build_method_of_modified_moments(sample)
                    }
                    result => result,
                }
            }
        }
    }

    /// Method of moments using mean, variance and skewness.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate sample, fewer than three
    /// points or a sample without positive skewness.
    pub fn build_method_of_moments(&self, sample: &Sample) -> Result<LogNormal> {
        require_univariate(sample, 3, "LogNormal")?;
        require_finite_sample(sample, "LogNormal")?;
        let (mean, sd, skewness) = scalar_moments(sample)?;
        let skewness = match skewness {
            Some(s) if s > 0.0 => s,
            _ => {
                return Err(Error::invalid_argument(
                    "cannot build a LogNormal distribution from a sample without positive skewness",
                ))
            }
        };
        // (ω + 2)²(ω - 1) is increasing on [1, ∞) and ≥ 9(ω - 1)
        let target = skewness * skewness;
        let omega = self.solver().solve(
            |w| Ok((w + 2.0) * (w + 2.0) * (w - 1.0)),
            target,
            1.0,
            1.0 + target / 9.0,
        )?;
        debug!("LogNormal moments: skewness {skewness} gives ω = {omega}");
        let sigma_log = omega.ln().sqrt();
        let mu_log = 0.5 * (sd * sd / (omega * (omega - 1.0))).ln();
        let gamma = mean - (mu_log + 0.5 * sigma_log * sigma_log).exp();
        described(LogNormal::new(mu_log, sigma_log, gamma)?, sample)
    }

    /// Modified moments: mean, variance and the expected smallest order
    /// statistic `γ + exp(μ_log + σ_log·z)` with `z = Φ⁻¹(1/(n+1))`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate sample, fewer than three
    /// points, a constant sample or a minimum too close to the mean
    /// (`(x̄ - x₍₁₎)/s ≥ -z`).
    pub fn build_method_of_modified_moments(&self, sample: &Sample) -> Result<LogNormal> {
        require_univariate(sample, 3, "LogNormal")?;
        require_finite_sample(sample, "LogNormal")?;
        let (mean, sd, _) = scalar_moments(sample)?;
        if sd <= 0.0 {
            return Err(Error::invalid_argument(
                "cannot build a LogNormal distribution from a constant sample",
            ));
        }
        let minimum = sample.min()?[0];
        let z = standard_normal_quantile(1.0 / (sample.size() as f64 + 1.0));
        let ratio = ((mean - minimum) / sd).powi(2);
        if ratio >= z * z {
            return Err(Error::invalid_argument(format!(
                "cannot build a LogNormal distribution by modified moments: (mean - min)/sd = {} is not below {}",
                ratio.sqrt(),
                -z
            )));
        }
        // in t = σ_log², (√ω - exp(z√t))² / (ω(ω - 1)) decreases from z² to 0
        let standardized_gap = |t: f64| -> Result<f64> {
            let gap = (0.5 * t).exp() - (z * t.sqrt()).exp();
            Ok(gap * gap / (t.exp() * t.exp_m1()))
        };
        let lower = 1e-10;
        let mut upper = 1.0;
        let mut steps = 0;
        while standardized_gap(upper)? > ratio {
            steps += 1;
            if steps > MAX_BRACKET_STEPS {
                return Err(Error::convergence(
                    "LogNormal modified moments",
                    steps,
                    "could not bracket σ_log",
                ));
            }
            upper *= 2.0;
        }
        let t = self.solver().solve(standardized_gap, ratio, lower, upper)?;
        let omega = t.exp();
        let sigma_log = t.sqrt();
        let mu_log = 0.5 * (sd * sd / (omega * t.exp_m1())).ln();
        let gamma = mean - mu_log.exp() * omega.sqrt();
        debug!("LogNormal modified moments: σ_log = {sigma_log}, γ = {gamma}");
        described(LogNormal::new(mu_log, sigma_log, gamma)?, sample)
    }

    /// Local maximum of the likelihood.
    ///
    /// For a fixed `γ` the likelihood is maximal at the log-sample mean and
    /// standard deviation; the remaining equation `∂ℓ/∂γ = 0` is bracketed
    /// around the modified-moments estimate, on the side where the score
    /// changes from positive to negative, and solved by Brent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate, too small or constant
    /// sample, and `NumericalConvergence` if the likelihood has no interior
    /// local maximum.
    pub fn build_method_of_local_likelihood_maximization(&self, sample: &Sample) -> Result<LogNormal> {
        require_univariate(sample, 3, "LogNormal")?;
        require_finite_sample(sample, "LogNormal")?;
        let values = sample.column(0);
        let minimum = sample.min()?[0];
        let width = sample.max()?[0] - minimum;
        if width <= 0.0 {
            return Err(Error::invalid_argument(
                "cannot build a LogNormal distribution from a constant sample",
            ));
        }
        let start = self
            .build_method_of_modified_moments(sample)
            .or_else(|_| self.build_method_of_moments(sample))
            .map(|d| d.gamma())
            .ok()
            .filter(|&g| g < minimum)
            .unwrap_or(minimum - width);
        let score = |g: f64| likelihood_score(&values, g);
        let score_start = score(start);

        let (a, b) = if score_start < 0.0 {
            // the maximum lies on the left where the score is positive again
            let mut step = width;
            let mut left = None;
            for _ in 0..MAX_BRACKET_STEPS {
                let candidate = start - step;
                if score(candidate) > 0.0 {
                    left = Some(candidate);
                    break;
                }
                step *= 2.0;
            }
            let left = left.ok_or_else(|| {
                Error::convergence(
                    "LogNormal likelihood",
                    MAX_BRACKET_STEPS,
                    "no local maximum below the modified-moments threshold",
                )
            })?;
            (left, start)
        } else if score_start > 0.0 {
            // between the start and the sample minimum the score must turn negative
            let mut distance = minimum - start;
            let mut right = None;
            for _ in 0..MAX_BRACKET_STEPS {
                distance *= 0.5;
                let candidate = minimum - distance;
                if score(candidate) < 0.0 {
                    right = Some(candidate);
                    break;
                }
            }
            let right = right.ok_or_else(|| {
                Error::convergence(
                    "LogNormal likelihood",
                    MAX_BRACKET_STEPS,
                    "the likelihood increases up to the sample minimum",
                )
            })?;
            (start, right)
        } else {
            (start, start)
        };
        let gamma = if a == b {
            a
        } else {
            self.solver()
                .solve_bracketed(|g| Ok(score(g)), a, b, score(a), score(b))?
        };
        let (mu_log, variance) = log_moments(&values, gamma);
        debug!("LogNormal likelihood: γ = {gamma}, μ_log = {mu_log}, σ_log² = {variance}");
        described(LogNormal::new(mu_log, variance.sqrt(), gamma)?, sample)
    }

    /// Build from `[μ_log, σ_log, γ]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless `σ_log > 0`.
    pub fn build_as_lognormal_from_parameters(&self, parameter: &Point) -> Result<LogNormal> {
        LogNormal::from_parameter(parameter)
    }

    fn solver(&self) -> Brent {
        Brent::new(
            self.settings.quantile_epsilon,
            self.settings.quantile_iterations,
        )
    }
}

impl DistributionFactoryImplementation for LogNormalFactory {
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
        self.build_as_lognormal(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_lognormal_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(LogNormal::default())
    }

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_attribute("settings", &self.settings)?;
        advocate.save_attribute("method", &self.method)
    }

    fn repr(&self) -> String {
        format!("class={} method={}", Self::CLASS_NAME, self.method)
    }
}

impl PersistentObject for LogNormalFactory {
    const CLASS_NAME: &'static str = "LogNormalFactory";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionFactoryImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        Ok(Self {
            settings: load_settings(advocate, Self::CLASS_NAME)?,
            method: advocate.load_attribute("method")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionImplementation;
    use crate::random::RandomGenerator;

    fn skewed_sample() -> Sample {
        let source = LogNormal::new(0.0, 0.6, 1.0).unwrap();
        let mut rng = RandomGenerator::with_seed(8);
        source.get_sample(20_000, &mut rng).unwrap()
    }

    fn assert_recovers(fitted: &LogNormal) {
        assert!(fitted.mu_log().abs() < 0.2, "μ_log = {}", fitted.mu_log());
        assert!((fitted.sigma_log() - 0.6).abs() < 0.08, "σ_log = {}", fitted.sigma_log());
        assert!((fitted.gamma() - 1.0).abs() < 0.2, "γ = {}", fitted.gamma());
    }

    #[test]
    fn test_fitted_moments_match_sample() {
        let source = LogNormal::new(0.5, 0.4, 2.0).unwrap();
        let mut rng = RandomGenerator::with_seed(21);
        let sample = source.get_sample(5000, &mut rng).unwrap();
        let fitted = LogNormalFactory::default().build_as_lognormal(&sample).unwrap();
        let mean = sample.compute_mean().unwrap()[0];
        let sd = sample.compute_standard_deviation().unwrap()[0];
        let skewness = sample.compute_skewness().unwrap()[0];
        assert!((fitted.get_mean().unwrap()[0] - mean).abs() < 1e-9);
        assert!((fitted.get_standard_deviation().unwrap()[0] - sd).abs() < 1e-9);
        assert!((fitted.compute_skewness().unwrap()[0] - skewness).abs() < 1e-8);
    }

    #[test]
    fn test_each_method_recovers_parameters() {
        let sample = skewed_sample();
        let factory = LogNormalFactory::default();
        for method in [
            LogNormalEstimationMethod::Moments,
            LogNormalEstimationMethod::ModifiedMoments,
            LogNormalEstimationMethod::LocalLikelihoodMaximization,
        ] {
            let fitted = factory.build_as_lognormal_with(&sample, method).unwrap();
            assert_recovers(&fitted);
        }
    }

    #[test]
    fn test_modified_moments_equations() {
        let sample = skewed_sample();
        let fitted = LogNormalFactory::default()
            .build_method_of_modified_moments(&sample)
            .unwrap();
        let mean = sample.compute_mean().unwrap()[0];
        let sd = sample.compute_standard_deviation().unwrap()[0];
        let minimum = sample.min().unwrap()[0];
        let z = standard_normal_quantile(1.0 / (sample.size() as f64 + 1.0));
        let expected_minimum =
            fitted.gamma() + (fitted.mu_log() + fitted.sigma_log() * z).exp();
        assert!((fitted.get_mean().unwrap()[0] - mean).abs() < 1e-8);
        assert!((fitted.get_standard_deviation().unwrap()[0] - sd).abs() < 1e-8);
        assert!((expected_minimum - minimum).abs() < 1e-8);
    }

    #[test]
    fn test_likelihood_estimate_is_stationary() {
        let sample = skewed_sample();
        let fitted = LogNormalFactory::default()
            .build_method_of_local_likelihood_maximization(&sample)
            .unwrap();
        let values = sample.column(0);
        assert!(fitted.gamma() < sample.min().unwrap()[0]);
        let (mu, variance) = log_moments(&values, fitted.gamma());
        assert!((fitted.mu_log() - mu).abs() < 1e-12);
        assert!((fitted.sigma_log() - variance.sqrt()).abs() < 1e-12);
        // score changes sign from + to - across the estimate
        let h = 1e-4 * (1.0 + fitted.gamma().abs());
        assert!(likelihood_score(&values, fitted.gamma() - h) > 0.0);
        assert!(likelihood_score(&values, fitted.gamma() + h) < 0.0);
    }

    #[test]
    fn test_configured_method_is_used_and_saved() {
        let sample = skewed_sample();
        let factory = LogNormalFactory::with_method(LogNormalEstimationMethod::ModifiedMoments);
        assert_eq!(
            factory.build(&sample).unwrap().parameter(),
            factory.build_method_of_modified_moments(&sample).unwrap().parameter()
        );
        let mut advocate = Advocate::new(LogNormalFactory::CLASS_NAME);
        PersistentObject::save(&factory, &mut advocate).unwrap();
        let restored = LogNormalFactory::load(&advocate).unwrap();
        assert_eq!(restored.method(), LogNormalEstimationMethod::ModifiedMoments);
        assert_eq!(restored.repr(), factory.repr());
    }

    #[test]
    fn test_rejects_negative_skewness() {
        let sample = Sample::from_scalars(&[0.0, 9.0, 10.0, 10.0, 10.5]);
        let factory = LogNormalFactory::default();
        assert!(factory.build(&sample).unwrap_err().is_invalid_argument());
        assert!(factory
            .build_method_of_modified_moments(&sample)
            .unwrap_err()
            .is_invalid_argument());
    }
}
