use super::{
    load_into, require_finite, require_positive, DistributionBase, DistributionImplementation,
    LOG_PDF_FLOOR,
};
use crate::error::{check_dimension, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::special::{
    inverse_regularized_lower_gamma, ln_gamma, regularized_lower_gamma, regularized_upper_gamma,
};
use crate::types::{CovarianceMatrix, Description, Interval, Point};

/// Gamma distribution with shape `k`, rate `λ` and location `γ`.
///
/// Density `λ^k (x - γ)^(k-1) e^(-λ(x - γ)) / Γ(k)` for `x > γ`.
#[derive(Debug, Clone)]
pub struct Gamma {
    base: DistributionBase,
    k: f64,
    lambda: f64,
    gamma: f64,
}

impl Gamma {
    /// Create a gamma distribution.
    ///
    /// # Errors
    ///
    /// Returns an error unless `k > 0`, `lambda > 0` and `gamma` is finite.
    pub fn new(k: f64, lambda: f64, gamma: f64) -> Result<Self> {
        Self::from_parameter(&Point::from_vec(vec![k, lambda, gamma]))
    }

    /// Create from the parameter vector `[k, λ, γ]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong length or invalid values.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        let mut gamma = Self::default();
        gamma.set_parameter(parameter)?;
        Ok(gamma)
    }

    /// Shape.
    #[must_use]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Rate.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Location.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn quantile(&self, q: f64) -> f64 {
        self.gamma + inverse_regularized_lower_gamma(self.k, q) / self.lambda
    }
}

impl Default for Gamma {
    fn default() -> Self {
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            k: 1.0,
            lambda: 1.0,
            gamma: 0.0,
        }
    }
}

impl DistributionImplementation for Gamma {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn base(&self) -> &DistributionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DistributionBase {
        &mut self.base
    }

    fn clone_box(&self) -> Box<dyn DistributionImplementation> {
        Box::new(self.clone())
    }

    fn parameter(&self) -> Point {
        Point::from_vec(vec![self.k, self.lambda, self.gamma])
    }

    fn parameter_description(&self) -> Description {
        Description::from(vec!["k", "lambda", "gamma"])
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        check_dimension(3, parameter.dimension())?;
        require_positive("k", parameter[0])?;
        require_positive("lambda", parameter[1])?;
        require_finite("gamma", parameter[2])?;
        self.k = parameter[0];
        self.lambda = parameter[1];
        self.gamma = parameter[2];
        self.base.invalidate_moments();
        Ok(())
    }

    fn range(&self) -> Interval {
        let upper = self.quantile(1.0 - self.base.settings().cdf_epsilon);
        Interval::univariate(self.gamma, upper, true, false)
    }

    fn compute_pdf(&self, x: &Point) -> Result<f64> {
        let log_pdf = self.compute_log_pdf(x)?;
        Ok(if log_pdf == LOG_PDF_FLOOR { 0.0 } else { log_pdf.exp() })
    }

    fn compute_log_pdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        let y = x[0] - self.gamma;
        if y <= 0.0 {
            return Ok(LOG_PDF_FLOOR);
        }
        Ok(self.k * self.lambda.ln() + (self.k - 1.0) * y.ln() - self.lambda * y - ln_gamma(self.k))
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        let y = x[0] - self.gamma;
        Ok(if y <= 0.0 {
            0.0
        } else {
            regularized_lower_gamma(self.k, self.lambda * y)
        })
    }

    fn compute_complementary_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        let y = x[0] - self.gamma;
        Ok(if y <= 0.0 {
            1.0
        } else {
            regularized_upper_gamma(self.k, self.lambda * y)
        })
    }

    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        Ok(self.quantile(q))
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        Ok(Point::scalar(
            self.gamma + rng.standard_gamma(self.k)? / self.lambda,
        ))
    }

    fn compute_mean(&self) -> Result<Point> {
        Ok(Point::scalar(self.gamma + self.k / self.lambda))
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        Ok(CovarianceMatrix::from_diagonal(&Point::scalar(
            self.k / (self.lambda * self.lambda),
        )))
    }

    fn compute_skewness(&self) -> Result<Point> {
        Ok(Point::scalar(2.0 / self.k.sqrt()))
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        Ok(Point::scalar(3.0 + 6.0 / self.k))
    }
}

impl PersistentObject for Gamma {
    const CLASS_NAME: &'static str = "Gamma";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        let mut gamma = Self::default();
        load_into(&mut gamma, advocate)?;
        Ok(gamma)
    }
}
