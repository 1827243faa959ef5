use std::fmt;
use std::sync::Arc;

use super::{
    Binomial, Dirichlet, DistributionImplementation, Exponential, Gamma, LogNormal, Normal,
    NormalCopula, TruncatedNormal, Uniform,
};
use crate::config::NumericalSettings;
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::{self, RandomGenerator};
use crate::types::{CovarianceMatrix, Description, Interval, Point, Sample};

/// Shared handle on a distribution implementation.
///
/// The handle narrows a few trait signatures to their common case:
/// [`Distribution::compute_quantile`] is the lower-tail quantile (the tail
/// flag lives in [`Distribution::compute_quantile_with_tail`]), and sampling
/// draws from the process-wide generator unless a `*_with` variant is given
/// an explicit one.
///
/// Cloning a `Distribution` copies a pointer. The first mutation through a
/// handle whose implementation is shared copies the implementation, so other
/// handles never observe the change.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let a = Distribution::from(Normal::new(0.0, 1.0).unwrap());
/// let mut b = a.clone();
/// b.set_parameter(&Point::from_vec(vec![5.0, 2.0])).unwrap();
///
/// assert_eq!(a.get_mean().unwrap(), Point::scalar(0.0));
/// assert_eq!(b.get_mean().unwrap(), Point::scalar(5.0));
/// ```
#[derive(Clone)]
pub struct Distribution {
    implementation: Arc<dyn DistributionImplementation>,
}

impl Distribution {
    /// Wrap an implementation.
    #[must_use]
    pub fn new<D: DistributionImplementation + 'static>(implementation: D) -> Self {
        Self {
            implementation: Arc::new(implementation),
        }
    }

    /// Wrap a boxed implementation.
    #[must_use]
    pub fn from_box(implementation: Box<dyn DistributionImplementation>) -> Self {
        Self {
            implementation: Arc::from(implementation),
        }
    }

    /// The underlying implementation.
    #[must_use]
    pub fn implementation(&self) -> &dyn DistributionImplementation {
        self.implementation.as_ref()
    }

    /// Whether two handles share the same implementation.
    #[must_use]
    pub fn shares_implementation_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.implementation, &other.implementation)
    }

    /// Mutable access, copying the implementation first if it is shared.
    fn implementation_mut(&mut self) -> &mut dyn DistributionImplementation {
        if Arc::get_mut(&mut self.implementation).is_none() {
            self.implementation = Arc::from(self.implementation.clone_box());
        }
        match Arc::get_mut(&mut self.implementation) {
            Some(implementation) => implementation,
            None => unreachable!("a freshly cloned implementation is not shared"),
        }
    }

    // ============ Identity ============

    /// Class tag.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.implementation.class_name()
    }

    /// Dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.implementation.dimension()
    }

    /// User-facing name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.implementation.base().name()
    }

    /// Set the user-facing name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.implementation_mut().base_mut().set_name(name);
    }

    /// Component names.
    #[must_use]
    pub fn description(&self) -> &Description {
        self.implementation.base().description()
    }

    /// Set the component names.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of names differs from the dimension.
    pub fn set_description(&mut self, description: Description) -> Result<()> {
        check_dimension(self.dimension(), description.len())?;
        self.implementation_mut()
            .base_mut()
            .set_description(description)
    }

    /// Numerical settings.
    #[must_use]
    pub fn settings(&self) -> &NumericalSettings {
        self.implementation.settings()
    }

    /// Replace the numerical settings.
    pub fn set_settings(&mut self, settings: NumericalSettings) {
        self.implementation_mut().base_mut().set_settings(settings);
    }

    // ============ Capabilities ============

    /// Whether the distribution has a density.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.implementation.is_continuous()
    }

    /// Whether the distribution has a discrete support.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        self.implementation.is_discrete()
    }

    /// Whether the support is made of integers.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        self.implementation.is_integral()
    }

    /// Whether the distribution is elliptical.
    #[must_use]
    pub fn is_elliptical(&self) -> bool {
        self.implementation.is_elliptical()
    }

    /// Whether the distribution is a copula.
    #[must_use]
    pub fn is_copula(&self) -> bool {
        self.implementation.is_copula()
    }

    /// Whether the components are independent.
    #[must_use]
    pub fn has_independent_copula(&self) -> bool {
        self.implementation.has_independent_copula()
    }

    // ============ Parameters ============

    /// Flat parameter vector.
    #[must_use]
    pub fn parameter(&self) -> Point {
        self.implementation.parameter()
    }

    /// Names of the parameter components.
    #[must_use]
    pub fn parameter_description(&self) -> Description {
        self.implementation.parameter_description()
    }

    /// Replace the parameters.
    ///
    /// A rejected update leaves the distribution unchanged.
    ///
    /// # Errors
    ///
    /// Returns the family's validation error.
    pub fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        self.implementation_mut().set_parameter(parameter)
    }

    // ============ Evaluation ============

    /// Support box (numerical range where unbounded).
    #[must_use]
    pub fn range(&self) -> Interval {
        self.implementation.range()
    }

    /// Support points of a discrete distribution.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` for continuous distributions.
    pub fn support(&self) -> Result<Sample> {
        self.implementation.support()
    }

    /// Density at `x`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `x` has the wrong dimension.
    pub fn compute_pdf(&self, x: &Point) -> Result<f64> {
        self.implementation.compute_pdf(x)
    }

    /// Log-density at `x`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `x` has the wrong dimension.
    pub fn compute_log_pdf(&self, x: &Point) -> Result<f64> {
        self.implementation.compute_log_pdf(x)
    }

    /// CDF at `x`.
    ///
    /// # Errors
    ///
    /// See [`DistributionImplementation::compute_cdf`].
    pub fn compute_cdf(&self, x: &Point) -> Result<f64> {
        self.implementation.compute_cdf(x)
    }

    /// Complementary CDF at `x`.
    ///
    /// # Errors
    ///
    /// See [`DistributionImplementation::compute_cdf`].
    pub fn compute_complementary_cdf(&self, x: &Point) -> Result<f64> {
        self.implementation.compute_complementary_cdf(x)
    }

    /// Survival function at `x`.
    ///
    /// # Errors
    ///
    /// See [`DistributionImplementation::compute_cdf`].
    pub fn compute_survival_function(&self, x: &Point) -> Result<f64> {
        self.implementation.compute_survival_function(x)
    }

    /// Probability of a box.
    ///
    /// # Errors
    ///
    /// See [`DistributionImplementation::compute_cdf`].
    pub fn compute_probability(&self, interval: &Interval) -> Result<f64> {
        self.implementation.compute_probability(interval)
    }

    /// Densities at every point of a sample.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the sample has the wrong dimension.
    pub fn compute_pdf_sample(&self, sample: &Sample) -> Result<Point> {
        check_dimension(self.dimension(), sample.dimension())?;
        sample.points().map(|x| self.compute_pdf(&x)).collect()
    }

    /// CDF values at every point of a sample.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the sample has the wrong dimension.
    pub fn compute_cdf_sample(&self, sample: &Sample) -> Result<Point> {
        check_dimension(self.dimension(), sample.dimension())?;
        sample.points().map(|x| self.compute_cdf(&x)).collect()
    }

    /// Quantile at probability `p`.
    ///
    /// Same as `compute_quantile_with_tail(p, false)`; the trait method
    /// [`DistributionImplementation::compute_quantile`] takes the tail flag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `p ∉ [0, 1]`.
    pub fn compute_quantile(&self, p: f64) -> Result<Point> {
        self.implementation.compute_quantile(p, false)
    }

    /// Quantile at probability `p`, of the upper tail when `tail` is set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `p ∉ [0, 1]`.
    pub fn compute_quantile_with_tail(&self, p: f64, tail: bool) -> Result<Point> {
        self.implementation.compute_quantile(p, tail)
    }

    /// Quantile of a univariate distribution as a scalar.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for multivariate distributions and
    /// `InvalidArgument` if `p ∉ [0, 1]`.
    pub fn compute_scalar_quantile(&self, p: f64) -> Result<f64> {
        check_dimension(1, self.dimension())?;
        Ok(self.compute_quantile(p)?[0])
    }

    /// Quantiles at several probabilities, one row each.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a probability is outside `[0, 1]`.
    pub fn compute_quantile_sample(&self, probabilities: &[f64]) -> Result<Sample> {
        let points = probabilities
            .iter()
            .map(|&p| self.compute_quantile(p))
            .collect::<Result<Vec<_>>>()?;
        if points.is_empty() {
            return Ok(Sample::empty(self.dimension()));
        }
        Sample::from_points(&points)
    }

    // ============ Sampling ============

    /// One realization drawn from the process-wide generator.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` if the family cannot be sampled.
    pub fn get_realization(&self) -> Result<Point> {
        let mut rng = random::global();
        self.implementation.get_realization(&mut rng)
    }

    /// One realization drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` if the family cannot be sampled.
    pub fn get_realization_with(&self, rng: &mut RandomGenerator) -> Result<Point> {
        self.implementation.get_realization(rng)
    }

    /// A sample drawn from the process-wide generator.
    ///
    /// The generator is locked for the whole call, so the sample is a
    /// contiguous segment of the global stream.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` if the family cannot be sampled.
    pub fn get_sample(&self, size: usize) -> Result<Sample> {
        let mut rng = random::global();
        self.implementation.get_sample(size, &mut rng)
    }

    /// A sample drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` if the family cannot be sampled.
    pub fn get_sample_with(&self, size: usize, rng: &mut RandomGenerator) -> Result<Sample> {
        self.implementation.get_sample(size, rng)
    }

    // ============ Moments ============

    /// Mean (cached).
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if a numerical fallback fails.
    pub fn get_mean(&self) -> Result<Point> {
        self.implementation.get_mean()
    }

    /// Covariance (cached).
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if a numerical fallback fails.
    pub fn get_covariance(&self) -> Result<CovarianceMatrix> {
        self.implementation.get_covariance()
    }

    /// Componentwise standard deviation.
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if a numerical fallback fails.
    pub fn get_standard_deviation(&self) -> Result<Point> {
        self.implementation.get_standard_deviation()
    }

    /// Componentwise skewness.
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if a numerical fallback fails.
    pub fn get_skewness(&self) -> Result<Point> {
        self.implementation.compute_skewness()
    }

    /// Componentwise kurtosis.
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if a numerical fallback fails.
    pub fn get_kurtosis(&self) -> Result<Point> {
        self.implementation.compute_kurtosis()
    }

    // ============ Marginals ============

    /// Marginal of component `i`.
    ///
    /// # Errors
    ///
    /// See [`DistributionImplementation::marginal`].
    pub fn marginal(&self, i: usize) -> Result<Self> {
        self.implementation.marginal(i)
    }

    /// Marginal of a subset of components.
    ///
    /// # Errors
    ///
    /// See [`DistributionImplementation::marginal_subset`].
    pub fn marginal_subset(&self, indices: &[usize]) -> Result<Self> {
        self.implementation.marginal_subset(indices)
    }

    // ============ Persistence ============

    /// Save into `advocate`.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be serialized.
    pub fn save(&self, advocate: &mut Advocate) -> Result<()> {
        self.implementation.save(advocate)
    }

    /// Save into a new advocate tagged with the class name.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be serialized.
    pub fn to_advocate(&self) -> Result<Advocate> {
        let mut advocate = Advocate::new(self.class_name());
        self.save(&mut advocate)?;
        Ok(advocate)
    }

    /// Rebuild a distribution of any known family from its record.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error for an unknown class tag or a malformed
    /// record.
    pub fn load(advocate: &Advocate) -> Result<Self> {
        Ok(match advocate.class_name() {
            Uniform::CLASS_NAME => Self::new(Uniform::load(advocate)?),
            Normal::CLASS_NAME => Self::new(Normal::load(advocate)?),
            LogNormal::CLASS_NAME => Self::new(LogNormal::load(advocate)?),
            Gamma::CLASS_NAME => Self::new(Gamma::load(advocate)?),
            Exponential::CLASS_NAME => Self::new(Exponential::load(advocate)?),
            Binomial::CLASS_NAME => Self::new(Binomial::load(advocate)?),
            TruncatedNormal::CLASS_NAME => Self::new(TruncatedNormal::load(advocate)?),
            Dirichlet::CLASS_NAME => Self::new(Dirichlet::load(advocate)?),
            NormalCopula::CLASS_NAME => Self::new(NormalCopula::load(advocate)?),
            other => {
                return Err(Error::persistence(format!(
                    "unknown distribution class '{other}'"
                )))
            }
        })
    }
}

impl<D: DistributionImplementation + 'static> From<D> for Distribution {
    fn from(implementation: D) -> Self {
        Self::new(implementation)
    }
}

impl PartialEq for Distribution {
    fn eq(&self, other: &Self) -> bool {
        self.class_name() == other.class_name()
            && self.dimension() == other.dimension()
            && self.parameter() == other.parameter()
    }
}

impl fmt::Debug for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.implementation.fmt(f)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.implementation.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_until_mutation() {
        let a = Distribution::from(Normal::new(0.0, 1.0).unwrap());
        let mut b = a.clone();
        assert!(a.shares_implementation_with(&b));
        b.set_name("renamed");
        assert!(!a.shares_implementation_with(&b));
        assert_eq!(a.name(), "Normal");
        assert_eq!(b.name(), "renamed");
    }

    #[test]
    fn test_rejected_parameter_leaves_state() {
        let mut d = Distribution::from(Uniform::new(0.0, 1.0).unwrap());
        let before = d.to_string();
        assert!(d.set_parameter(&Point::from_vec(vec![2.0, 1.0])).is_err());
        assert_eq!(d.to_string(), before);
    }

    #[test]
    fn test_quantile_variants_agree() {
        let gamma = Gamma::new(2.0, 1.5, 0.0).unwrap();
        let d = Distribution::from(gamma.clone());
        for &p in &[0.05, 0.5, 0.95] {
            let lower = d.compute_quantile(p).unwrap();
            assert_eq!(lower, d.compute_quantile_with_tail(p, false).unwrap());
            assert_eq!(lower, gamma.compute_quantile(p, false).unwrap());
            assert_eq!(
                d.compute_quantile_with_tail(p, true).unwrap(),
                gamma.compute_quantile(p, true).unwrap()
            );
        }
    }

    #[test]
    fn test_mutation_invalidates_mean() {
        let mut d = Distribution::from(Uniform::new(0.0, 2.0).unwrap());
        assert_eq!(d.get_mean().unwrap(), Point::scalar(1.0));
        d.set_parameter(&Point::from_vec(vec![2.0, 6.0])).unwrap();
        assert_eq!(d.get_mean().unwrap(), Point::scalar(4.0));
    }

    #[test]
    fn test_load_unknown_class() {
        let advocate = Advocate::new("Weibull");
        assert!(matches!(
            Distribution::load(&advocate),
            Err(Error::Persistence { .. })
        ));
    }

    #[test]
    fn test_scalar_quantile_requires_univariate() {
        let d = Distribution::from(NormalCopula::independent(2));
        assert!(d.compute_scalar_quantile(0.5).is_err());
    }

    #[test]
    fn test_quantile_sample() {
        let d = Distribution::from(Uniform::new(0.0, 4.0).unwrap());
        let q = d.compute_quantile_sample(&[0.25, 0.5]).unwrap();
        assert_eq!(q.column(0), vec![1.0, 2.0]);
    }
}
