use super::{load_into, require_finite, DistributionBase, DistributionImplementation};
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{CovarianceMatrix, Description, Interval, Point};

/// Continuous uniform distribution on `[a, b]`.
#[derive(Debug, Clone)]
pub struct Uniform {
    base: DistributionBase,
    a: f64,
    b: f64,
}

impl Uniform {
    /// Create a uniform distribution on `[a, b]`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `a < b` with both bounds finite.
    pub fn new(a: f64, b: f64) -> Result<Self> {
        Self::validate(a, b)?;
        Ok(Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            a,
            b,
        })
    }

    /// Create from the parameter vector `[a, b]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong length or invalid values.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        check_dimension(2, parameter.dimension())?;
        Self::new(parameter[0], parameter[1])
    }

    fn validate(a: f64, b: f64) -> Result<()> {
        require_finite("a", a)?;
        require_finite("b", b)?;
        if a >= b {
            return Err(Error::invalid_argument(format!(
                "lower bound a={a} must be less than upper bound b={b}"
            )));
        }
        Ok(())
    }

    /// Lower bound.
    #[must_use]
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Upper bound.
    #[must_use]
    pub fn b(&self) -> f64 {
        self.b
    }
}

impl Default for Uniform {
    /// Uniform distribution on `[-1, 1]`.
    fn default() -> Self {
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            a: -1.0,
            b: 1.0,
        }
    }
}

impl DistributionImplementation for Uniform {
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
        Point::from_vec(vec![self.a, self.b])
    }

    fn parameter_description(&self) -> Description {
        Description::from(vec!["a", "b"])
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        check_dimension(2, parameter.dimension())?;
        Self::validate(parameter[0], parameter[1])?;
        self.a = parameter[0];
        self.b = parameter[1];
        self.base.invalidate_moments();
        Ok(())
    }

    fn range(&self) -> Interval {
        Interval::univariate(self.a, self.b, true, true)
    }

    fn compute_pdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        Ok(if x[0] < self.a || x[0] > self.b {
            0.0
        } else {
            1.0 / (self.b - self.a)
        })
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        Ok(((x[0] - self.a) / (self.b - self.a)).clamp(0.0, 1.0))
    }

    fn compute_complementary_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        Ok(((self.b - x[0]) / (self.b - self.a)).clamp(0.0, 1.0))
    }

    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        Ok(self.a + q * (self.b - self.a))
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        Ok(Point::scalar(self.a + rng.uniform() * (self.b - self.a)))
    }

    fn compute_mean(&self) -> Result<Point> {
        Ok(Point::scalar(0.5 * (self.a + self.b)))
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        let width = self.b - self.a;
        Ok(CovarianceMatrix::from_diagonal(&Point::scalar(
            width * width / 12.0,
        )))
    }

    fn compute_skewness(&self) -> Result<Point> {
        Ok(Point::scalar(0.0))
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        Ok(Point::scalar(1.8))
    }
}

impl PersistentObject for Uniform {
    const CLASS_NAME: &'static str = "Uniform";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        let mut uniform = Self::default();
        load_into(&mut uniform, advocate)?;
        Ok(uniform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_forms() {
        let u = Uniform::new(2.0, 6.0).unwrap();
        assert_eq!(u.compute_pdf(&Point::scalar(3.0)).unwrap(), 0.25);
        assert_eq!(u.compute_pdf(&Point::scalar(7.0)).unwrap(), 0.0);
        assert_eq!(u.compute_cdf(&Point::scalar(3.0)).unwrap(), 0.25);
        assert_eq!(u.compute_cdf(&Point::scalar(-3.0)).unwrap(), 0.0);
        assert_eq!(u.compute_quantile(0.75, false).unwrap()[0], 5.0);
        assert_eq!(u.get_mean().unwrap()[0], 4.0);
        assert!((u.get_covariance().unwrap().get(0, 0) - 16.0 / 12.0).abs() < 1e-15);
    }

    #[test]
    fn test_rejects_invalid_bounds() {
        assert!(Uniform::new(1.0, 1.0).unwrap_err().is_invalid_argument());
        assert!(Uniform::new(0.0, f64::INFINITY).is_err());
        let mut u = Uniform::default();
        assert!(u.set_parameter(&Point::from_vec(vec![3.0, 2.0])).is_err());
        assert_eq!(u.parameter(), Point::from_vec(vec![-1.0, 1.0]));
    }

    #[test]
    fn test_sample_in_range() {
        let u = Uniform::new(-2.0, 3.0).unwrap();
        let mut rng = RandomGenerator::with_seed(3);
        let sample = u.get_sample(500, &mut rng).unwrap();
        assert!(sample.min().unwrap()[0] >= -2.0);
        assert!(sample.max().unwrap()[0] <= 3.0);
    }

    #[test]
    fn test_persistence() {
        let mut u = Uniform::new(0.5, 1.5).unwrap();
        u.base_mut().set_name("width");
        let restored = Uniform::load(&u.to_advocate().unwrap()).unwrap();
        assert_eq!(restored.repr(), u.repr());
        assert_eq!(u.repr(), "class=Uniform name=width dimension=1 a=0.5 b=1.5");
    }
}
