//! Probability distributions.
//!
//! Every family implements [`DistributionImplementation`]. Only the density,
//! the range, the parameters and the bookkeeping accessors are required: the
//! CDF, quantile, moments and sampling have central numerical defaults that a
//! family overrides when it knows a closed form.
//!
//! Client code works with the [`Distribution`] handle, which shares one
//! implementation between clones and copies it before the first mutation.
//!
//! ## Available Families
//!
//! | Family | Dimension | Parameters |
//! |--------|-----------|------------|
//! | [`Uniform`] | 1 | a, b |
//! | [`Normal`] | d | μ, σ, correlation R |
//! | [`LogNormal`] | 1 | μ_log, σ_log, γ |
//! | [`Gamma`] | 1 | k, λ, γ |
//! | [`Exponential`] | 1 | λ, γ |
//! | [`Binomial`] | 1 | n, p |
//! | [`TruncatedNormal`] | 1 | μ, σ, a, b |
//! | [`Dirichlet`] | d | θ (d + 1 values) |
//! | [`NormalCopula`] | d | correlation R |
//!
//! ## Usage
//!
//! ```
//! use uqcore::prelude::*;
//!
//! let normal = Distribution::from(Normal::new(0.0, 1.0).unwrap());
//! let x = normal.compute_quantile(0.975).unwrap();
//! assert!((normal.compute_cdf(&x).unwrap() - 0.975).abs() < 1e-12);
//! ```

mod base;
mod binomial;
mod dirichlet;
mod exponential;
mod fallback;
mod gamma;
mod handle;
mod lognormal;
mod normal;
mod normal_copula;
mod truncated_normal;
mod uniform;

pub use base::DistributionBase;
pub use binomial::Binomial;
pub use dirichlet::Dirichlet;
pub use exponential::Exponential;
pub use gamma::Gamma;
pub use handle::Distribution;
pub use lognormal::LogNormal;
pub use normal::Normal;
pub use normal_copula::NormalCopula;
pub use truncated_normal::TruncatedNormal;
pub use uniform::Uniform;

use std::fmt;

use crate::config::NumericalSettings;
use crate::error::{check_dimension, Error, Result};
use crate::persistence::Advocate;
use crate::random::RandomGenerator;
use crate::types::{CovarianceMatrix, Description, Interval, Point, Sample};

/// Value returned by [`DistributionImplementation::compute_log_pdf`] where the
/// density vanishes.
pub const LOG_PDF_FLOOR: f64 = -f64::MAX;

/// Fail unless `value` is finite and strictly positive.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

/// Fail unless `value` is finite.
pub(crate) fn require_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

/// Trait implemented by every distribution family.
///
/// Implementations must be cheap to clone through [`clone_box`] and safe to
/// share between threads.
///
/// [`clone_box`]: DistributionImplementation::clone_box
pub trait DistributionImplementation: Send + Sync + fmt::Debug {
    // ============ Identity ============

    /// Class tag, also used for persistence.
    fn class_name(&self) -> &'static str;

    /// Shared state.
    fn base(&self) -> &DistributionBase;

    /// Mutable shared state.
    fn base_mut(&mut self) -> &mut DistributionBase;

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn DistributionImplementation>;

    /// Dimension.
    fn dimension(&self) -> usize {
        self.base().dimension()
    }

    /// Numerical settings used by the fallbacks.
    fn settings(&self) -> &NumericalSettings {
        self.base().settings()
    }

    // ============ Capabilities ============

    /// Whether the distribution has a density.
    fn is_continuous(&self) -> bool {
        true
    }

    /// Whether the distribution has a finite or countable support.
    fn is_discrete(&self) -> bool {
        false
    }

    /// Whether the support is made of integers.
    fn is_integral(&self) -> bool {
        false
    }

    /// Whether the density is a function of a quadratic form.
    fn is_elliptical(&self) -> bool {
        false
    }

    /// Whether the distribution is a copula.
    fn is_copula(&self) -> bool {
        false
    }

    /// Whether the components are independent.
    fn has_independent_copula(&self) -> bool {
        self.dimension() == 1
    }

    // ============ Parameters ============

    /// Flat parameter vector.
    fn parameter(&self) -> Point;

    /// Names of the parameter components.
    fn parameter_description(&self) -> Description;

    /// Replace the parameters.
    ///
    /// The new values are validated before anything is written, and the
    /// cached moments are invalidated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the values are outside the family's domain
    /// or `DimensionMismatch` if the vector has the wrong length.
    fn set_parameter(&mut self, parameter: &Point) -> Result<()>;

    // ============ Support ============

    /// Mathematical support, cut to a numerical range where it is unbounded.
    fn range(&self) -> Interval;

    /// Support points inside the range (discrete families).
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` for continuous families.
    fn support(&self) -> Result<Sample> {
        Err(Error::not_implemented(self.class_name(), "support"))
    }

    // ============ Density and CDF ============

    /// Density (probability mass for discrete families).
    ///
    /// Returns 0 outside the support.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `x` has the wrong dimension.
    fn compute_pdf(&self, x: &Point) -> Result<f64>;

    /// Log-density, [`LOG_PDF_FLOOR`] where the density is 0.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_pdf`].
    fn compute_log_pdf(&self, x: &Point) -> Result<f64> {
        let pdf = self.compute_pdf(x)?;
        Ok(if pdf > 0.0 { pdf.ln() } else { LOG_PDF_FLOOR })
    }

    /// Cumulative distribution function `P(X ≤ x)`.
    ///
    /// The default integrates the density: adaptive Gauss-Kronrod in
    /// dimension 1, tensor Gauss-Legendre up to
    /// [`NumericalSettings::max_fallback_dimension`]. Discrete families sum
    /// the mass of their support.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` on a wrong-sized point,
    /// `NumericalConvergence` if the quadrature fails, and `NotImplemented`
    /// above the fallback dimension.
    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(self.dimension(), x.dimension())?;
        if self.is_discrete() {
            fallback::discrete_cdf(self, x[0])
        } else if self.dimension() == 1 {
            fallback::univariate_cdf(self, x[0])
        } else {
            fallback::multivariate_cdf(self, x)
        }
    }

    /// `1 - CDF(x)`.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_cdf`].
    fn compute_complementary_cdf(&self, x: &Point) -> Result<f64> {
        Ok(0.5 + (0.5 - self.compute_cdf(x)?))
    }

    /// Survival function `P(X > x)` (componentwise).
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_cdf`].
    fn compute_survival_function(&self, x: &Point) -> Result<f64> {
        check_dimension(self.dimension(), x.dimension())?;
        if self.dimension() == 1 {
            return self.compute_complementary_cdf(x);
        }
        let upper = self.range().upper_bound().clone();
        if x.iter().zip(upper.iter()).any(|(xi, ui)| xi >= ui) {
            return Ok(0.0);
        }
        self.compute_probability(&Interval::new(x.clone(), upper)?)
    }

    /// Probability of the box `interval`.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_cdf`].
    fn compute_probability(&self, interval: &Interval) -> Result<f64> {
        check_dimension(self.dimension(), interval.dimension())?;
        fallback::probability(self, interval)
    }

    // ============ Quantiles ============

    /// Quantile of a univariate distribution at level `q ∈ (0, 1)`.
    ///
    /// The default solves `CDF(x) = q` with Brent's method inside the range;
    /// discrete families return the smallest support point with `CDF ≥ q`.
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if the solver fails.
    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        if self.is_discrete() {
            fallback::discrete_quantile(self, q)
        } else {
            fallback::univariate_quantile(self, q)
        }
    }

    /// Quantile of a multivariate distribution at level `q ∈ (0, 1)`.
    ///
    /// The default returns the point on the marginal quantile curve
    /// `(F₁⁻¹(τ), …, F_d⁻¹(τ))` whose CDF is `q`.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` if the family has no marginals and
    /// `NumericalConvergence` if the solver fails.
    fn compute_multivariate_quantile(&self, q: f64) -> Result<Point> {
        fallback::diagonal_quantile(self, q)
    }

    /// Quantile at probability `p`; with `tail` the upper-tail quantile
    /// (level `1 - p`).
    ///
    /// Levels 0 and 1 map to the bounds of the range. The
    /// [`Distribution`] handle exposes this as `compute_quantile(p)` for the
    /// lower tail and `compute_quantile_with_tail(p, tail)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `p ∉ [0, 1]`, otherwise the error of the
    /// underlying algorithm.
    fn compute_quantile(&self, p: f64, tail: bool) -> Result<Point> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::invalid_argument(format!(
                "quantile level must be in [0, 1], got {p}"
            )));
        }
        let q = if tail { 0.5 + (0.5 - p) } else { p };
        if q <= 0.0 {
            return Ok(self.range().lower_bound().clone());
        }
        if q >= 1.0 {
            return Ok(self.range().upper_bound().clone());
        }
        if self.dimension() == 1 {
            Ok(Point::scalar(self.compute_scalar_quantile(q)?))
        } else {
            self.compute_multivariate_quantile(q)
        }
    }

    // ============ Sampling ============

    /// One realization.
    ///
    /// The default inverts the CDF of a univariate distribution.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` for multivariate families without a sampler.
    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        if self.dimension() != 1 {
            return Err(Error::not_implemented(self.class_name(), "get_realization"));
        }
        let u = rng.uniform_open();
        Ok(Point::scalar(self.compute_scalar_quantile(u)?))
    }

    /// `size` independent realizations.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::get_realization`].
    fn get_sample(&self, size: usize, rng: &mut RandomGenerator) -> Result<Sample> {
        let mut values = Vec::with_capacity(size * self.dimension());
        for _ in 0..size {
            values.extend(self.get_realization(rng)?.into_vec());
        }
        let mut sample = Sample::from_shape_vec(size, self.dimension(), values)?;
        sample.set_description(self.base().description().clone())?;
        Ok(sample)
    }

    // ============ Moments ============

    /// Mean, without caching.
    ///
    /// The default integrates numerically (summation for discrete families,
    /// marginal means in dimension ≥ 2).
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if the integration fails.
    fn compute_mean(&self) -> Result<Point> {
        if self.dimension() == 1 {
            Ok(Point::scalar(fallback::univariate_moment(self, 1, 0.0)?))
        } else {
            fallback::multivariate_mean(self)
        }
    }

    /// Covariance, without caching.
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if the integration fails.
    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        if self.dimension() == 1 {
            let mean = self.get_mean()?[0];
            let variance = fallback::univariate_moment(self, 2, mean)?;
            Ok(CovarianceMatrix::from_diagonal(&Point::scalar(variance)))
        } else {
            fallback::multivariate_covariance(self)
        }
    }

    /// Componentwise skewness.
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if the integration fails, or
    /// `NotImplemented` if a multivariate family has no marginals.
    fn compute_skewness(&self) -> Result<Point> {
        fallback::standardized_moments(self, 3)
    }

    /// Componentwise kurtosis (3 for a normal distribution).
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_skewness`].
    fn compute_kurtosis(&self) -> Result<Point> {
        fallback::standardized_moments(self, 4)
    }

    /// Cached mean.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_mean`].
    fn get_mean(&self) -> Result<Point> {
        self.base().cached_mean(|| self.compute_mean())
    }

    /// Cached covariance.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_covariance`].
    fn get_covariance(&self) -> Result<CovarianceMatrix> {
        self.base().cached_covariance(|| self.compute_covariance())
    }

    /// Componentwise standard deviation.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::compute_covariance`].
    fn get_standard_deviation(&self) -> Result<Point> {
        Ok(self
            .get_covariance()?
            .diagonal()
            .iter()
            .map(|v| v.sqrt())
            .collect())
    }

    // ============ Marginals ============

    /// Marginal distribution of component `i`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `i` is out of bounds and `NotImplemented`
    /// for multivariate families without marginals.
    fn marginal(&self, i: usize) -> Result<Distribution> {
        if i >= self.dimension() {
            return Err(Error::invalid_argument(format!(
                "marginal index {i} is out of bounds for dimension {}",
                self.dimension()
            )));
        }
        if self.dimension() == 1 {
            return Ok(Distribution::from_box(self.clone_box()));
        }
        Err(Error::not_implemented(self.class_name(), "marginal"))
    }

    /// Marginal distribution of a subset of components.
    ///
    /// # Errors
    ///
    /// Same as [`DistributionImplementation::marginal`].
    fn marginal_subset(&self, indices: &[usize]) -> Result<Distribution> {
        match indices {
            [i] => self.marginal(*i),
            _ if indices.iter().copied().eq(0..self.dimension()) => {
                Ok(Distribution::from_box(self.clone_box()))
            }
            _ => Err(Error::not_implemented(self.class_name(), "marginal_subset")),
        }
    }

    // ============ Persistence and display ============

    /// Write the shared state and the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be serialized.
    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        self.base().save(advocate)?;
        advocate.save_attribute("parameter", &self.parameter())
    }

    /// Text representation `class=… name=… dimension=… <parameters>`.
    fn repr(&self) -> String {
        let mut repr = format!(
            "class={} name={} dimension={}",
            self.class_name(),
            self.base().name(),
            self.dimension()
        );
        for (name, value) in self
            .parameter_description()
            .iter()
            .zip(self.parameter().iter())
        {
            repr.push_str(&format!(" {name}={value}"));
        }
        repr
    }
}

/// Restore the shared state and parameters saved by
/// [`DistributionImplementation::save`] into `target`.
pub(crate) fn load_into<D>(target: &mut D, advocate: &Advocate) -> Result<()>
where
    D: DistributionImplementation + ?Sized,
{
    advocate.check_class(target.class_name())?;
    let parameter: Point = advocate.load_attribute("parameter")?;
    target.set_parameter(&parameter)?;
    target.base_mut().load(advocate)
}
