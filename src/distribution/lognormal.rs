use super::{
    load_into, require_finite, require_positive, DistributionBase, DistributionImplementation,
    LOG_PDF_FLOOR,
};
use crate::error::{check_dimension, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::special::{standard_normal_cdf, standard_normal_complementary_cdf, standard_normal_quantile};
use crate::types::{CovarianceMatrix, Description, Interval, Point};

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Three-parameter log-normal distribution: `ln(X - γ) ~ N(μ_log, σ_log²)`.
#[derive(Debug, Clone)]
pub struct LogNormal {
    base: DistributionBase,
    mu_log: f64,
    sigma_log: f64,
    gamma: f64,
}

impl LogNormal {
    /// Create a log-normal distribution.
    ///
    /// # Errors
    ///
    /// Returns an error unless `sigma_log > 0` and the other values are
    /// finite.
    pub fn new(mu_log: f64, sigma_log: f64, gamma: f64) -> Result<Self> {
        let mut lognormal = Self::default();
        lognormal.set_parameter(&Point::from_vec(vec![mu_log, sigma_log, gamma]))?;
        Ok(lognormal)
    }

    /// Create from the parameter vector `[μ_log, σ_log, γ]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong length or invalid values.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        let mut lognormal = Self::default();
        lognormal.set_parameter(parameter)?;
        Ok(lognormal)
    }

    /// Mean of `ln(X - γ)`.
    #[must_use]
    pub fn mu_log(&self) -> f64 {
        self.mu_log
    }

    /// Standard deviation of `ln(X - γ)`.
    #[must_use]
    pub fn sigma_log(&self) -> f64 {
        self.sigma_log
    }

    /// Location.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn quantile(&self, q: f64) -> f64 {
        self.gamma + (self.mu_log + self.sigma_log * standard_normal_quantile(q)).exp()
    }

    fn standardize(&self, x: f64) -> Option<f64> {
        (x > self.gamma).then(|| ((x - self.gamma).ln() - self.mu_log) / self.sigma_log)
    }
}

impl Default for LogNormal {
    fn default() -> Self {
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, 1),
            mu_log: 0.0,
            sigma_log: 1.0,
            gamma: 0.0,
        }
    }
}

impl DistributionImplementation for LogNormal {
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
        Point::from_vec(vec![self.mu_log, self.sigma_log, self.gamma])
    }

    fn parameter_description(&self) -> Description {
        Description::from(vec!["mu_log", "sigma_log", "gamma"])
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        check_dimension(3, parameter.dimension())?;
        require_finite("mu_log", parameter[0])?;
        require_positive("sigma_log", parameter[1])?;
        require_finite("gamma", parameter[2])?;
        self.mu_log = parameter[0];
        self.sigma_log = parameter[1];
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
        Ok(match self.standardize(x[0]) {
            Some(z) => -0.5 * z * z - LN_SQRT_2PI - self.sigma_log.ln() - (x[0] - self.gamma).ln(),
            None => LOG_PDF_FLOOR,
        })
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        Ok(self.standardize(x[0]).map_or(0.0, standard_normal_cdf))
    }

    fn compute_complementary_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(1, x.dimension())?;
        Ok(self
            .standardize(x[0])
            .map_or(1.0, standard_normal_complementary_cdf))
    }

    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        Ok(self.quantile(q))
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        let z = rng.standard_normal();
        Ok(Point::scalar(
            self.gamma + (self.mu_log + self.sigma_log * z).exp(),
        ))
    }

    fn compute_mean(&self) -> Result<Point> {
        let s2 = self.sigma_log * self.sigma_log;
        Ok(Point::scalar(self.gamma + (self.mu_log + 0.5 * s2).exp()))
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        let s2 = self.sigma_log * self.sigma_log;
        let variance = (2.0 * self.mu_log + s2).exp() * s2.exp_m1();
        Ok(CovarianceMatrix::from_diagonal(&Point::scalar(variance)))
    }

    fn compute_skewness(&self) -> Result<Point> {
        let w = (self.sigma_log * self.sigma_log).exp();
        Ok(Point::scalar((w + 2.0) * (w - 1.0).sqrt()))
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        let w = (self.sigma_log * self.sigma_log).exp();
        Ok(Point::scalar(
            w.powi(4) + 2.0 * w.powi(3) + 3.0 * w.powi(2) - 3.0,
        ))
    }
}

impl PersistentObject for LogNormal {
    const CLASS_NAME: &'static str = "LogNormal";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        let mut lognormal = Self::default();
        load_into(&mut lognormal, advocate)?;
        Ok(lognormal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_forms() {
        let d = LogNormal::new(0.5, 0.4, 1.0).unwrap();
        let median = d.compute_quantile(0.5, false).unwrap()[0];
        assert!((median - (1.0 + 0.5f64.exp())).abs() < 1e-12);
        assert!((d.compute_cdf(&Point::scalar(median)).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(d.compute_pdf(&Point::scalar(0.5)).unwrap(), 0.0);
        assert_eq!(d.compute_log_pdf(&Point::scalar(1.0)).unwrap(), LOG_PDF_FLOOR);
        let mean = d.get_mean().unwrap()[0];
        assert!((mean - (1.0 + (0.5f64 + 0.08).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_closed_forms_match_quadrature() {
        let d = LogNormal::new(0.0, 0.5, 0.0).unwrap();
        let variance = d.get_covariance().unwrap().get(0, 0);
        let mean = d.get_mean().unwrap()[0];
        let (a, b) = {
            let range = d.range();
            (range.lower_bound()[0], range.upper_bound()[0])
        };
        let numeric = crate::algo::GaussKronrod::default()
            .integrate(
                |x| (x - mean).powi(2) * d.compute_pdf(&Point::scalar(x)).unwrap_or(0.0),
                a,
                b,
            )
            .unwrap();
        assert!((numeric - variance).abs() < 1e-7);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(LogNormal::new(0.0, 0.0, 0.0).is_err());
        assert!(LogNormal::new(f64::NAN, 1.0, 0.0).is_err());
    }
}
