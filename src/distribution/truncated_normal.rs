use super::{
    load_into, require_finite, require_positive, DistributionBase, DistributionImplementation,
};
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::special::{
    standard_normal_cdf, standard_normal_complementary_cdf, standard_normal_pdf,
    standard_normal_quantile,
};
use crate::types::{CovarianceMatrix, Description, Interval, Point};

/// Normal distribution `N(μ, σ²)` conditioned on `[a, b]`.
#[derive(Debug, Clone)]
pub struct TruncatedNormal {
    base: DistributionBase,
    mu: f64,
    sigma: f64,
    a: f64,
    b: f64,
    /// `α > 0`: masses are taken from the upper tail.
    upper_tail: bool,
    /// `Φ(α)` with `α = (a - μ)/σ`, or `Φ̄(α)` in the upper tail.
    tail_a: f64,
    /// `Φ(β) - Φ(α)`, computed as `Φ̄(α) - Φ̄(β)` in the upper tail.
    normalization: f64,
}

/// Reference mass at `α` and normalization of `[α, β]`, reflected to the
/// complementary CDF when `α > 0` so that upper-tail intervals do not cancel.
fn tail_masses(alpha: f64, beta: f64) -> (bool, f64, f64) {
    if alpha > 0.0 {
        let tail_a = standard_normal_complementary_cdf(alpha);
        (true, tail_a, tail_a - standard_normal_complementary_cdf(beta))
    } else {
        let tail_a = standard_normal_cdf(alpha);
        (false, tail_a, standard_normal_cdf(beta) - tail_a)
    }
}

impl TruncatedNormal {
    /// Create a truncated normal distribution.
    ///
    /// # Errors
    ///
    /// Returns an error unless `sigma > 0`, `a < b` with finite bounds, and
    /// `[a, b]` carries a positive normal mass.
    pub fn new(mu: f64, sigma: f64, a: f64, b: f64) -> Result<Self> {
        Self::from_parameter(&Point::from_vec(vec![mu, sigma, a, b]))
    }

    /// Create from the parameter vector `[μ, σ, a, b]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong length or invalid values.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        let mut truncated = Self::default();
        truncated.set_parameter(parameter)?;
        Ok(truncated)
    }

    /// Mean of the underlying normal.
    #[must_use]
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Standard deviation of the underlying normal.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
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

    fn alpha(&self) -> f64 {
        (self.a - self.mu) / self.sigma
    }

    fn beta(&self) -> f64 {
        (self.b - self.mu) / self.sigma
    }

    fn quantile(&self, q: f64) -> f64 {
        let z = if self.upper_tail {
            -standard_normal_quantile(self.tail_a - q * self.normalization)
        } else {
            standard_normal_quantile(self.tail_a + q * self.normalization)
        };
        (self.mu + self.sigma * z).clamp(self.a, self.b)
    }
}

impl Default for TruncatedNormal {
    /// Standard normal truncated to `[-1, 1]`.
    fn default() -> Self {
        let (upper_tail, tail_a, normalization) = tail_masses(-1.0, 1.0);
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            mu: 0.0,
            sigma: 1.0,
            a: -1.0,
            b: 1.0,
            upper_tail,
            tail_a,
            normalization,
        }
    }
}

impl DistributionImplementation for TruncatedNormal {
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
        Point::from_vec(vec![self.mu, self.sigma, self.a, self.b])
    }

    fn parameter_description(&self) -> Description {
        Description::from(vec!["mu", "sigma", "a", "b"])
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        check_dimension(4, parameter.dimension())?;
        let (mu, sigma, a, b) = (parameter[0], parameter[1], parameter[2], parameter[3]);
        require_finite("mu", mu)?;
        require_positive("sigma", sigma)?;
        require_finite("a", a)?;
        require_finite("b", b)?;
        if a >= b {
            return Err(Error::invalid_argument(format!(
                "lower bound a={a} must be less than upper bound b={b}"
            )));
        }
        let (upper_tail, tail_a, normalization) = tail_masses((a - mu) / sigma, (b - mu) / sigma);
        if normalization <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "[{a}, {b}] has no mass under N({mu}, {sigma}²)"
            )));
        }
        self.mu = mu;
        self.sigma = sigma;
        self.a = a;
        self.b = b;
        self.upper_tail = upper_tail;
        self.tail_a = tail_a;
        self.normalization = normalization;
        self.base.invalidate_moments();
        Ok(())
    }

    fn range(&self) -> Interval {
        Interval::univariate(self.a, self.b, true, true)
    }

    fn compute_pdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        if x[0] < self.a || x[0] > self.b {
            return Ok(0.0);
        }
        let z = (x[0] - self.mu) / self.sigma;
        Ok(standard_normal_pdf(z) / (self.sigma * self.normalization))
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        if x[0] <= self.a {
            return Ok(0.0);
        }
        if x[0] >= self.b {
            return Ok(1.0);
        }
        let z = (x[0] - self.mu) / self.sigma;
        let mass = if self.upper_tail {
            self.tail_a - standard_normal_complementary_cdf(z)
        } else {
            standard_normal_cdf(z) - self.tail_a
        };
        Ok((mass / self.normalization).clamp(0.0, 1.0))
    }

    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        Ok(self.quantile(q))
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        Ok(Point::scalar(self.quantile(rng.uniform())))
    }

    fn compute_mean(&self) -> Result<Point> {
        let (pa, pb) = (standard_normal_pdf(self.alpha()), standard_normal_pdf(self.beta()));
        Ok(Point::scalar(
            self.mu + self.sigma * (pa - pb) / self.normalization,
        ))
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        let (alpha, beta) = (self.alpha(), self.beta());
        let (pa, pb) = (standard_normal_pdf(alpha), standard_normal_pdf(beta));
        let z = self.normalization;
        let shift = (pa - pb) / z;
        let variance =
            self.sigma * self.sigma * (1.0 + (alpha * pa - beta * pb) / z - shift * shift);
        Ok(CovarianceMatrix::from_diagonal(&Point::scalar(variance)))
    }
}

impl PersistentObject for TruncatedNormal {
    const CLASS_NAME: &'static str = "TruncatedNormal";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        let mut truncated = Self::default();
        load_into(&mut truncated, advocate)?;
        Ok(truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_truncation() {
        let t = TruncatedNormal::new(2.0, 1.5, 0.5, 3.5).unwrap();
        assert!((t.get_mean().unwrap()[0] - 2.0).abs() < 1e-14);
        assert!((t.compute_cdf(&Point::scalar(2.0)).unwrap() - 0.5).abs() < 1e-14);
        assert!(t.compute_skewness().unwrap()[0].abs() < 1e-6);
    }

    #[test]
    fn test_variance_matches_quadrature() {
        let t = TruncatedNormal::new(0.0, 1.0, -0.5, 2.0).unwrap();
        let closed = t.get_covariance().unwrap().get(0, 0);
        let mean = t.get_mean().unwrap()[0];
        let numeric = crate::algo::GaussKronrod::default()
            .integrate(
                |x| (x - mean).powi(2) * t.compute_pdf(&Point::scalar(x)).unwrap_or(0.0),
                -0.5,
                2.0,
            )
            .unwrap();
        assert!((closed - numeric).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_stays_in_bounds() {
        let t = TruncatedNormal::new(0.0, 1.0, 1.0, 4.0).unwrap();
        for &p in &[0.0, 1e-9, 0.5, 1.0 - 1e-9, 1.0] {
            let x = t.compute_quantile(p, false).unwrap()[0];
            assert!((1.0..=4.0).contains(&x));
        }
        let x = t.compute_quantile(0.3, false).unwrap();
        assert!((t.compute_cdf(&x).unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_upper_tail_quantile_inverts_cdf() {
        let t = TruncatedNormal::new(0.0, 1.0, 8.0, 9.0).unwrap();
        for &p in &[0.01, 0.1, 0.5, 0.9, 0.99] {
            let x = t.compute_quantile(p, false).unwrap();
            assert!((8.0..=9.0).contains(&x[0]));
            let c = t.compute_cdf(&x).unwrap();
            assert!((c - p).abs() < 1e-6, "p={p} x={} cdf={c}", x[0]);
        }
        // mirrored lower tail
        let m = TruncatedNormal::new(0.0, 1.0, -9.0, -8.0).unwrap();
        let x = m.compute_quantile(0.1, false).unwrap();
        assert!((m.compute_cdf(&x).unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(TruncatedNormal::new(0.0, 1.0, 2.0, 1.0).is_err());
        assert!(TruncatedNormal::new(0.0, -1.0, 0.0, 1.0).is_err());
        assert!(TruncatedNormal::new(0.0, 1.0, 50.0, 60.0).is_err());
    }
}
