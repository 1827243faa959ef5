use super::{load_into, DistributionBase, DistributionImplementation};
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::special::{ln_gamma, regularized_incomplete_beta};
use crate::types::{CovarianceMatrix, Description, Interval, Point, Sample};

/// Binomial distribution: number of successes in `n` trials of probability `p`.
#[derive(Debug, Clone)]
pub struct Binomial {
    base: DistributionBase,
    n: u64,
    p: f64,
}

impl Binomial {
    /// Create a binomial distribution.
    ///
    /// # Errors
    ///
    /// Returns an error unless `p ∈ [0, 1]`.
    pub fn new(n: u64, p: f64) -> Result<Self> {
        Self::validate_probability(p)?;
        Ok(Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            n,
            p,
        })
    }

    /// Create from the parameter vector `[n, p]`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `n` is a non-negative integer and `p ∈ [0, 1]`.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        let mut binomial = Self::default();
        binomial.set_parameter(parameter)?;
        Ok(binomial)
    }

    fn validate_probability(p: f64) -> Result<()> {
        if (0.0..=1.0).contains(&p) {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "success probability must be in [0, 1], got {p}"
            )))
        }
    }

    /// Number of trials.
    #[must_use]
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Success probability.
    #[must_use]
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Mass at the integer `k ∈ [0, n]`.
    fn mass(&self, k: u64) -> f64 {
        if self.p == 0.0 {
            return if k == 0 { 1.0 } else { 0.0 };
        }
        if self.p == 1.0 {
            return if k == self.n { 1.0 } else { 0.0 };
        }
        let (n, k) = (self.n as f64, k as f64);
        (ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
            + k * self.p.ln()
            + (n - k) * (-self.p).ln_1p())
        .exp()
    }

    /// The integer `k ∈ [0, n]` that `x` rounds to, if it is one.
    fn support_index(&self, x: f64) -> Option<u64> {
        let k = x.round();
        let on_grid = (x - k).abs() <= self.base.settings().support_epsilon;
        (on_grid && k >= 0.0 && k <= self.n as f64).then_some(k as u64)
    }
}

impl Default for Binomial {
    fn default() -> Self {
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            n: 1,
            p: 0.5,
        }
    }
}

impl DistributionImplementation for Binomial {
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

    fn is_continuous(&self) -> bool {
        false
    }

    fn is_discrete(&self) -> bool {
        true
    }

    fn is_integral(&self) -> bool {
        true
    }

    fn parameter(&self) -> Point {
        Point::from_vec(vec![self.n as f64, self.p])
    }

    fn parameter_description(&self) -> Description {
        Description::from(vec!["n", "p"])
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        check_dimension(2, parameter.dimension())?;
        let (n, p) = (parameter[0], parameter[1]);
        if !(n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64) {
            return Err(Error::invalid_argument(format!(
                "number of trials must be a non-negative integer, got {n}"
            )));
        }
        Self::validate_probability(p)?;
        self.n = n as u64;
        self.p = p;
        self.base.invalidate_moments();
        Ok(())
    }

    fn range(&self) -> Interval {
        Interval::univariate(0.0, self.n as f64, true, true)
    }

    fn support(&self) -> Result<Sample> {
        let values: Vec<f64> = (0..=self.n).map(|k| k as f64).collect();
        Ok(Sample::from_scalars(&values))
    }

    fn compute_pdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        Ok(self.support_index(x[0]).map_or(0.0, |k| self.mass(k)))
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        let k = (x[0] + self.base.settings().support_epsilon).floor();
        if k < 0.0 {
            return Ok(0.0);
        }
        if k >= self.n as f64 {
            return Ok(1.0);
        }
        // P(X ≤ k) = I_{1-p}(n - k, k + 1)
        Ok(regularized_incomplete_beta(
            1.0 - self.p,
            self.n as f64 - k,
            k + 1.0,
        ))
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        let u = rng.uniform();
        let mut cdf = 0.0;
        for k in 0..self.n {
            cdf += self.mass(k);
            if u < cdf {
                return Ok(Point::scalar(k as f64));
            }
        }
        Ok(Point::scalar(self.n as f64))
    }

    fn compute_mean(&self) -> Result<Point> {
        Ok(Point::scalar(self.n as f64 * self.p))
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        Ok(CovarianceMatrix::from_diagonal(&Point::scalar(
            self.n as f64 * self.p * (1.0 - self.p),
        )))
    }

    fn compute_skewness(&self) -> Result<Point> {
        let variance = self.n as f64 * self.p * (1.0 - self.p);
        if variance == 0.0 {
            return Err(Error::domain("skewness of a degenerate binomial is undefined"));
        }
        Ok(Point::scalar((1.0 - 2.0 * self.p) / variance.sqrt()))
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        let variance = self.n as f64 * self.p * (1.0 - self.p);
        if variance == 0.0 {
            return Err(Error::domain("kurtosis of a degenerate binomial is undefined"));
        }
        Ok(Point::scalar(
            3.0 + (1.0 - 6.0 * self.p * (1.0 - self.p)) / variance,
        ))
    }
}

impl PersistentObject for Binomial {
    const CLASS_NAME: &'static str = "Binomial";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        let mut binomial = Self::default();
        load_into(&mut binomial, advocate)?;
        Ok(binomial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_and_cdf() {
        let b = Binomial::new(4, 0.5).unwrap();
        let masses: Vec<f64> = (0..=4)
            .map(|k| b.compute_pdf(&Point::scalar(f64::from(k))).unwrap())
            .collect();
        let expected = [1.0, 4.0, 6.0, 4.0, 1.0].map(|c| c / 16.0);
        for (m, e) in masses.iter().zip(expected.iter()) {
            assert!((m - e).abs() < 1e-12);
        }
        assert_eq!(b.compute_pdf(&Point::scalar(1.5)).unwrap(), 0.0);
        assert!((b.compute_cdf(&Point::scalar(1.0)).unwrap() - 5.0 / 16.0).abs() < 1e-12);
        assert!((b.compute_cdf(&Point::scalar(1.7)).unwrap() - 5.0 / 16.0).abs() < 1e-12);
        assert_eq!(b.compute_cdf(&Point::scalar(-0.5)).unwrap(), 0.0);
        assert_eq!(b.compute_cdf(&Point::scalar(4.0)).unwrap(), 1.0);
    }

    #[test]
    fn test_discrete_quantile() {
        let b = Binomial::new(4, 0.5).unwrap();
        assert_eq!(b.compute_quantile(0.3, false).unwrap()[0], 1.0);
        assert_eq!(b.compute_quantile(0.3125, false).unwrap()[0], 1.0);
        assert_eq!(b.compute_quantile(0.32, false).unwrap()[0], 2.0);
        assert_eq!(b.compute_quantile(0.99, false).unwrap()[0], 4.0);
    }

    #[test]
    fn test_probability_of_interval() {
        let b = Binomial::new(4, 0.5).unwrap();
        let p = b
            .compute_probability(&Interval::univariate(0.5, 2.5, true, true))
            .unwrap();
        assert!((p - 10.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_cases() {
        let b = Binomial::new(3, 1.0).unwrap();
        assert_eq!(b.compute_pdf(&Point::scalar(3.0)).unwrap(), 1.0);
        assert_eq!(b.compute_cdf(&Point::scalar(2.0)).unwrap(), 0.0);
        assert!(b.compute_skewness().is_err());
        assert!(Binomial::new(3, 1.5).is_err());
        assert!(Binomial::from_parameter(&Point::from_vec(vec![2.5, 0.5])).is_err());
    }

    #[test]
    fn test_sample_mean() {
        let b = Binomial::new(10, 0.3).unwrap();
        let mut rng = RandomGenerator::with_seed(8);
        let sample = b.get_sample(10_000, &mut rng).unwrap();
        let mean = sample.compute_mean().unwrap()[0];
        assert!((mean - 3.0).abs() < 0.06);
        assert!(sample.points().all(|x| x[0].fract() == 0.0));
    }
}
