//! Estimation of distributions from samples.
//!
//! A factory maps a [`Sample`] to a fitted [`Distribution`]. Each family has a
//! factory implementing [`DistributionFactoryImplementation`] with its
//! canonical estimator (method of moments or maximum likelihood) plus a typed
//! `build_as_<family>` variant. [`DistributionFactory`] is the type-erased
//! handle and [`FactoryRegistry`] the queryable collection of factories.
//!
//! ## Estimators
//!
//! | Factory | Estimator |
//! |---------|-----------|
//! | [`UniformFactory`] | moments |
//! | [`NormalFactory`] | moments (mean, unbiased covariance) |
//! | [`LogNormalFactory`] | moments with skewness; modified moments or local likelihood on request |
//! | [`GammaFactory`] | moments with skewness |
//! | [`ExponentialFactory`] | moments |
//! | [`TruncatedNormalFactory`] | moments, damped Newton |
//! | [`BinomialFactory`] | maximum likelihood, search over `n` |
//! | [`DirichletFactory`] | maximum likelihood, fixed point |
//! | [`NormalCopulaFactory`] | Kendall tau inversion |
//!
//! ## Usage
//!
//! ```
//! use uqcore::prelude::*;
//!
//! let mut rng = RandomGenerator::with_seed(1);
//! let sample = Normal::new(3.0, 2.0)
//!     .unwrap()
//!     .get_sample(5000, &mut rng)
//!     .unwrap();
//!
//! let fitted = NormalFactory::default().build_as_normal(&sample).unwrap();
//! assert!((fitted.mu()[0] - 3.0).abs() < 0.2);
//! ```

mod binomial;
mod dirichlet;
mod exponential;
mod gamma;
mod handle;
mod lognormal;
mod normal;
mod normal_copula;
mod registry;
mod truncated_normal;
mod uniform;

pub use binomial::BinomialFactory;
pub use dirichlet::DirichletFactory;
pub use exponential::ExponentialFactory;
pub use gamma::GammaFactory;
pub use handle::DistributionFactory;
pub use lognormal::{LogNormalEstimationMethod, LogNormalFactory};
pub use normal::NormalFactory;
pub use normal_copula::NormalCopulaFactory;
pub use registry::{Dimensionality, FactoryRegistry};
pub use truncated_normal::TruncatedNormalFactory;
pub use uniform::UniformFactory;

use std::fmt;

use log::{debug, warn};

use crate::config::NumericalSettings;
use crate::distribution::{Distribution, DistributionImplementation};
use crate::error::{Error, Result};
use crate::persistence::Advocate;
use crate::random::{self, RandomGenerator};
use crate::types::{CovarianceMatrix, Point, Sample};

/// A fitted distribution together with the covariance of its parameters.
#[derive(Debug, Clone)]
pub struct ParameterEstimate {
    distribution: Distribution,
    parameter_covariance: CovarianceMatrix,
}

impl ParameterEstimate {
    /// Bundle a distribution with its parameter covariance.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the covariance does not match the
    /// number of parameters.
    pub fn new(distribution: Distribution, parameter_covariance: CovarianceMatrix) -> Result<Self> {
        crate::error::check_dimension(
            distribution.parameter().dimension(),
            parameter_covariance.dimension(),
        )?;
        Ok(Self {
            distribution,
            parameter_covariance,
        })
    }

    /// The fitted distribution.
    #[must_use]
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Covariance of the estimated parameter vector.
    #[must_use]
    pub fn parameter_covariance(&self) -> &CovarianceMatrix {
        &self.parameter_covariance
    }

    /// Standard deviation of each estimated parameter.
    #[must_use]
    pub fn parameter_standard_deviation(&self) -> Point {
        self.parameter_covariance
            .diagonal()
            .iter()
            .map(|v| v.sqrt())
            .collect()
    }
}

/// Trait implemented by every factory.
pub trait DistributionFactoryImplementation: Send + Sync + fmt::Debug {
    /// Class tag, also used for persistence.
    fn class_name(&self) -> &'static str;

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn DistributionFactoryImplementation>;

    /// Settings of the estimators.
    fn settings(&self) -> &NumericalSettings;

    /// Replace the settings.
    fn set_settings(&mut self, settings: NumericalSettings);

    /// Class tag of the distributions this factory builds.
    fn distribution_class_name(&self) -> &'static str {
        self.build_default().class_name()
    }

    /// Fit a distribution to `sample` with the canonical estimator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the sample is too small, has the wrong
    /// dimension or leads to a degenerate estimate, and
    /// `NumericalConvergence` if an iterative estimator fails.
    fn build(&self, sample: &Sample) -> Result<Distribution>;

    /// Build a distribution from its flat parameter vector.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the parameters are outside the family's
    /// domain.
    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution>;

    /// The family's default instance.
    fn build_default(&self) -> Distribution;

    /// Fit a distribution and estimate the covariance of its parameters.
    ///
    /// The default refits the distribution on
    /// [`NumericalSettings::bootstrap_size`] bootstrap resamples drawn from
    /// `rng`. Resamples on which the estimator fails are skipped.
    ///
    /// # Errors
    ///
    /// Returns the error of [`DistributionFactoryImplementation::build`] on the
    /// full sample, or `InvalidArgument` if fewer than two resamples could be
    /// fitted.
    fn build_estimate_with(
        &self,
        sample: &Sample,
        rng: &mut RandomGenerator,
    ) -> Result<ParameterEstimate> {
        let distribution = self.build(sample)?;
        let parameters = bootstrap_parameters(self, sample, rng)?;
        let covariance = parameters.compute_covariance()?;
        ParameterEstimate::new(distribution, covariance)
    }

    /// [`DistributionFactoryImplementation::build_estimate_with`] using the
    /// process-wide generator.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionFactoryImplementation::build_estimate_with`].
    fn build_estimate(&self, sample: &Sample) -> Result<ParameterEstimate> {
        let mut rng = random::global();
        self.build_estimate_with(sample, &mut rng)
    }

    /// Write the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized.
    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_attribute("settings", self.settings())
    }

    /// Text representation.
    fn repr(&self) -> String {
        format!("class={}", self.class_name())
    }
}

/// Parameters of the distributions fitted on bootstrap resamples of `sample`.
fn bootstrap_parameters<F>(factory: &F, sample: &Sample, rng: &mut RandomGenerator) -> Result<Sample>
where
    F: DistributionFactoryImplementation + ?Sized,
{
    let size = sample.size();
    let resamples = factory.settings().bootstrap_size;
    let mut parameters: Vec<Point> = Vec::with_capacity(resamples);
    for _ in 0..resamples {
        let mut resample = Sample::empty(sample.dimension());
        for _ in 0..size {
            resample.add(&sample.row(rng.integer(size)))?;
        }
        match factory.build(&resample) {
            Ok(distribution) => parameters.push(distribution.parameter()),
            Err(error) => debug!("{}: skipping bootstrap resample: {error}", factory.class_name()),
        }
    }
    if parameters.len() < resamples {
        warn!(
            "{}: {} of {resamples} bootstrap resamples could not be fitted",
            factory.class_name(),
            resamples - parameters.len()
        );
    }
    if parameters.len() < 2 {
        return Err(Error::invalid_argument(format!(
            "{}: fewer than two bootstrap resamples could be fitted",
            factory.class_name()
        )));
    }
    Sample::from_points(&parameters)
}

/// Load the settings saved by [`DistributionFactoryImplementation::save`].
pub(crate) fn load_settings(advocate: &Advocate, class_name: &str) -> Result<NumericalSettings> {
    advocate.check_class(class_name)?;
    advocate.load_attribute("settings")
}

/// Fail unless `sample` is univariate with at least `minimum` points.
pub(crate) fn require_univariate(sample: &Sample, minimum: usize, family: &str) -> Result<()> {
    if sample.dimension() != 1 {
        return Err(Error::invalid_argument(format!(
            "can build a {family} distribution only from a sample of dimension 1, got dimension {}",
            sample.dimension()
        )));
    }
    require_size(sample, minimum, family)
}

/// Fail unless `sample` has at least `minimum` points.
pub(crate) fn require_size(sample: &Sample, minimum: usize, family: &str) -> Result<()> {
    if sample.size() < minimum {
        return Err(Error::invalid_argument(format!(
            "cannot build a {family} distribution from a sample of size {}, need at least {minimum}",
            sample.size()
        )));
    }
    Ok(())
}

/// Fail unless every value of `sample` is finite.
pub(crate) fn require_finite_sample(sample: &Sample, family: &str) -> Result<()> {
    if sample.data().iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "cannot build a {family} distribution from a sample with non-finite values"
        )))
    }
}

/// Give a fitted distribution the component names of its sample.
pub(crate) fn described<D: DistributionImplementation>(mut distribution: D, sample: &Sample) -> Result<D> {
    distribution
        .base_mut()
        .set_description(sample.description().clone())?;
    Ok(distribution)
}

/// Univariate mean, unbiased standard deviation and skewness.
pub(crate) fn scalar_moments(sample: &Sample) -> Result<(f64, f64, Option<f64>)> {
    let mean = sample.compute_mean()?[0];
    let sd = sample.compute_standard_deviation()?[0];
    let skewness = if sample.size() >= 3 && sd > 0.0 {
        Some(sample.compute_skewness()?[0])
    } else {
        None
    };
    Ok((mean, sd, skewness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Normal;

    #[test]
    fn test_bootstrap_estimate_shape() {
        let mut rng = RandomGenerator::with_seed(3);
        let sample = Normal::new(0.0, 1.0).unwrap().get_sample(200, &mut rng).unwrap();
        let factory = UniformFactory::default();
        let estimate = factory.build_estimate_with(&sample, &mut rng).unwrap();
        assert_eq!(estimate.parameter_covariance().dimension(), 2);
        assert!(estimate
            .parameter_standard_deviation()
            .iter()
            .all(|s| *s > 0.0 && *s < 1.0));
    }

    #[test]
    fn test_bootstrap_fails_when_every_resample_fails() {
        let factory = UniformFactory::default();
        let mut rng = RandomGenerator::with_seed(3);
        let err = factory
            .build_estimate_with(&Sample::from_scalars(&[1.0]), &mut rng)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_require_univariate() {
        let sample = Sample::new(5, 2);
        assert!(require_univariate(&sample, 2, "Normal").is_err());
        assert!(require_univariate(&Sample::from_scalars(&[1.0]), 2, "Normal").is_err());
        assert!(require_univariate(&Sample::from_scalars(&[1.0, 2.0]), 2, "Normal").is_ok());
    }
}
