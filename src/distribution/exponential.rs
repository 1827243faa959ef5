use super::{
    load_into, require_finite, require_positive, DistributionBase, DistributionImplementation,
};
use crate::error::{check_dimension, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{CovarianceMatrix, Description, Interval, Point};

/// Exponential distribution with rate `λ` and location `γ`.
#[derive(Debug, Clone)]
pub struct Exponential {
    base: DistributionBase,
    lambda: f64,
    gamma: f64,
}

impl Exponential {
    /// Create an exponential distribution.
    ///
    /// # Errors
    ///
    /// Returns an error unless `lambda > 0` and `gamma` is finite.
    pub fn new(lambda: f64, gamma: f64) -> Result<Self> {
        Self::from_parameter(&Point::from_vec(vec![lambda, gamma]))
    }

    /// Create from the parameter vector `[λ, γ]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong length or invalid values.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        let mut exponential = Self::default();
        exponential.set_parameter(parameter)?;
        Ok(exponential)
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
        self.gamma - (-q).ln_1p() / self.lambda
    }
}

impl Default for Exponential {
    fn default() -> Self {
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            lambda: 1.0,
            gamma: 0.0,
        }
    }
}

impl DistributionImplementation for Exponential {
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
        Point::from_vec(vec![self.lambda, self.gamma])
    }

    fn parameter_description(&self) -> Description {
        Description::from(vec!["lambda", "gamma"])
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        check_dimension(2, parameter.dimension())?;
        require_positive("lambda", parameter[0])?;
        require_finite("gamma", parameter[1])?;
        self.lambda = parameter[0];
        self.gamma = parameter[1];
        self.base.invalidate_moments();
        Ok(())
    }

    fn range(&self) -> Interval {
        let upper = self.gamma - self.base.settings().cdf_epsilon.ln() / self.lambda;
        Interval::univariate(self.gamma, upper, true, false)
    }

    fn compute_pdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        let y = x[0] - self.gamma;
        Ok(if y < 0.0 {
            0.0
        } else {
            self.lambda * (-self.lambda * y).exp()
        })
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        let y = x[0] - self.gamma;
        Ok(if y <= 0.0 {
            0.0
        } else {
            -(-self.lambda * y).exp_m1()
        })
    }

    fn compute_complementary_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        let y = x[0] - self.gamma;
        Ok(if y <= 0.0 {
            1.0
        } else {
            (-self.lambda * y).exp()
        })
    }

    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        Ok(self.quantile(q))
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        Ok(Point::scalar(
            self.gamma - rng.uniform_open().ln() / self.lambda,
        ))
    }

    fn compute_mean(&self) -> Result<Point> {
        Ok(Point::scalar(self.gamma + 1.0 / self.lambda))
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        Ok(CovarianceMatrix::from_diagonal(&Point::scalar(
            1.0 / (self.lambda * self.lambda),
        )))
    }

    fn compute_skewness(&self) -> Result<Point> {
        Ok(Point::scalar(2.0))
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        Ok(Point::scalar(9.0))
    }
}

impl PersistentObject for Exponential {
    const CLASS_NAME: &'static str = "Exponential";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        let mut exponential = Self::default();
        load_into(&mut exponential, advocate)?;
        Ok(exponential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_forms() {
        let e = Exponential::new(2.0, 1.0).unwrap();
        let x = e.compute_quantile(0.5, false).unwrap()[0];
        assert!((x - (1.0 + 2f64.ln() / 2.0)).abs() < 1e-15);
        assert!((e.compute_cdf(&Point::scalar(x)).unwrap() - 0.5).abs() < 1e-15);
        assert_eq!(e.compute_pdf(&Point::scalar(0.0)).unwrap(), 0.0);
        assert_eq!(e.get_mean().unwrap()[0], 1.5);
    }

    #[test]
    fn test_tail_quantile() {
        let e = Exponential::new(1.0, 0.0).unwrap();
        let x = e.compute_quantile(1e-10, true).unwrap()[0];
        assert!((x - 10.0 * 10f64.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_skewness_matches_quadrature() {
        let e = Exponential::new(3.0, 0.0).unwrap();
        let mean = e.get_mean().unwrap()[0];
        let sd = e.get_standard_deviation().unwrap()[0];
        let range = e.range();
        let third = crate::algo::GaussKronrod::default()
            .integrate(
                |x| ((x - mean) / sd).powi(3) * 3.0 * (-3.0 * x).exp(),
                range.lower_bound()[0],
                range.upper_bound()[0],
            )
            .unwrap();
        assert!((third - 2.0).abs() < 1e-6);
    }
}
